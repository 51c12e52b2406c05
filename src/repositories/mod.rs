pub mod department;
pub mod employee;
pub mod unit_of_work;

pub use department::DepartmentRepository;
pub use employee::EmployeeRepository;
pub use unit_of_work::UnitOfWork;
