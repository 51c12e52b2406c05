use std::sync::Arc;

use employee_manager_backend::models::department::Department;
use employee_manager_backend::models::employee::Employee;
use employee_manager_backend::repositories::UnitOfWork;
use employee_manager_backend::store::{EntityStore, MemoryStore, StoreError};

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

async fn seed_department(store: &Arc<MemoryStore>, name: &str) -> i64 {
    let uow = UnitOfWork::new(store.clone());
    let id = uow.departments().add(Department::new(name, "D-01")).await;
    assert_eq!(uow.save_changes().await.unwrap(), 1);
    id.get().expect("department id assigned on commit")
}

async fn seed_employees(store: &Arc<MemoryStore>, names: &[&str]) -> Vec<i64> {
    let uow = UnitOfWork::new(store.clone());
    let mut ids = Vec::new();
    for name in names {
        ids.push(uow.employees().add(Employee::new(*name, "someone@example.com")).await);
    }
    uow.save_changes().await.unwrap();
    ids.iter().map(|id| id.get().unwrap()).collect()
}

#[tokio::test]
async fn committed_employee_reads_back_unchanged() {
    let store = store();
    let department_id = seed_department(&store, "Engineering").await;

    let mut employee = Employee::new("Ada", "ada@example.com").in_department(department_id);
    employee.age = Some(36);
    employee.address = Some("12 St James's Square".into());
    employee.phone = Some("+442071234567".into());
    employee.salary = 9100.5;
    employee.is_active = false;
    employee.image_name = Some("ada.png".into());

    let uow = UnitOfWork::new(store.clone());
    let id = uow.employees().add(employee.clone()).await;
    assert_eq!(id.get(), None);
    assert_eq!(uow.save_changes().await.unwrap(), 1);

    let id = id.get().unwrap();
    let stored = uow.employees().get(id).await.unwrap().unwrap();
    assert_eq!(stored, Employee { id, ..employee });
    assert!(stored.department.is_none());
}

#[tokio::test]
async fn missing_ids_read_as_none() {
    let uow = UnitOfWork::new(store());
    assert!(uow.employees().get(404).await.unwrap().is_none());
    assert!(uow.departments().get(404).await.unwrap().is_none());
}

#[tokio::test]
async fn blank_search_lists_everyone() {
    let store = store();
    let department_id = seed_department(&store, "Engineering").await;
    seed_employees(&store, &["Ada", "Grace", "Linus"]).await;

    let uow = UnitOfWork::new(store.clone());
    let hired = uow.employees().add(Employee::new("Ken", "ken@example.com").in_department(department_id)).await;
    uow.save_changes().await.unwrap();

    let all = uow.employees().get_all(None).await.unwrap();
    let blank = uow.employees().get_all(Some("")).await.unwrap();
    let eager = uow.employees().get_all_with_departments().await.unwrap();

    assert_eq!(all.len(), 4);
    assert_eq!(all, blank);

    let stripped: Vec<Employee> = eager
        .into_iter()
        .map(|e| {
            if e.id == hired.get().unwrap() {
                assert_eq!(e.department.as_ref().unwrap().name, "Engineering");
            }
            Employee { department: None, ..e }
        })
        .collect();
    assert_eq!(all, stripped);
}

#[tokio::test]
async fn search_is_a_case_insensitive_substring_match() {
    let store = store();
    seed_employees(&store, &["Ada Lovelace", "ABC Corp Liaison", "Grace Hopper", "xabcx"]).await;

    let uow = UnitOfWork::new(store.clone());
    let names = |list: Vec<Employee>| list.into_iter().map(|e| e.name).collect::<Vec<_>>();

    let first = names(uow.employees().get_all(Some("abc")).await.unwrap());
    assert_eq!(first, vec!["ABC Corp Liaison", "xabcx"]);

    let again = names(uow.employees().get_all(Some("abc")).await.unwrap());
    assert_eq!(first, again);

    assert_eq!(names(uow.employees().get_all(Some("HOPPER")).await.unwrap()), vec!["Grace Hopper"]);
    assert!(uow.employees().get_all(Some("zzz")).await.unwrap().is_empty());
}

#[tokio::test]
async fn repositories_of_one_unit_of_work_commit_together() {
    let store = store();
    let department_id = seed_department(&store, "Engineering").await;

    let uow = UnitOfWork::new(store.clone());
    let employee = uow.employees().add(Employee::new("Ada", "ada@example.com").in_department(department_id)).await;
    let department = uow.departments().add(Department::new("Research", "R-01")).await;
    assert_eq!(uow.pending_changes(), 2);

    assert_eq!(uow.save_changes().await.unwrap(), 2);
    assert_eq!(uow.pending_changes(), 0);

    assert!(store.find_employee(employee.get().unwrap()).await.unwrap().is_some());
    assert!(store.find_department(department.get().unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn rejected_commit_drops_every_repository_change() {
    let store = store();

    let uow = UnitOfWork::new(store.clone());
    uow.departments().add(Department::new("Research", "R-01")).await;
    uow.employees().add(Employee::new("Ada", "ada@example.com").in_department(999)).await;

    let err = uow.save_changes().await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
    assert_eq!(uow.pending_changes(), 0);

    assert!(store.list_departments().await.unwrap().is_empty());
    assert!(store.list_employees(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn saving_nothing_returns_zero() {
    let store = store();
    seed_department(&store, "Engineering").await;

    let uow = UnitOfWork::new(store.clone());
    assert_eq!(uow.save_changes().await.unwrap(), 0);
    assert_eq!(store.list_departments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_of_unknown_id_affects_zero_rows() {
    let store = store();
    let uow = UnitOfWork::new(store.clone());

    let mut ghost = Employee::new("Nobody", "nobody@example.com");
    ghost.id = 12345;
    uow.employees().update(ghost);

    assert_eq!(uow.save_changes().await.unwrap(), 0);
    assert!(store.list_employees(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_replaces_the_whole_record() {
    let store = store();
    let ids = seed_employees(&store, &["Ada"]).await;

    let uow = UnitOfWork::new(store.clone());
    let mut employee = uow.employees().get(ids[0]).await.unwrap().unwrap();
    employee.name = "Ada King".into();
    employee.salary = 12000.0;
    uow.employees().update(employee.clone());
    assert_eq!(uow.save_changes().await.unwrap(), 1);

    assert_eq!(uow.employees().get(ids[0]).await.unwrap().unwrap(), employee);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let store = store();
    let ids = seed_employees(&store, &["Ada", "Grace"]).await;

    let uow = UnitOfWork::new(store.clone());
    let ada = uow.employees().get(ids[0]).await.unwrap().unwrap();
    uow.employees().delete(&ada);
    assert_eq!(uow.save_changes().await.unwrap(), 1);

    let remaining = uow.employees().get_all(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Grace");
}

#[tokio::test]
async fn eager_listing_resolves_departments() {
    let store = store();
    let uow = UnitOfWork::new(store.clone());

    let department = uow.departments().add(Department::new("Engineering", "ENG")).await;
    let ada = uow
        .employees()
        .add_to_department(Employee::new("Ada", "ada@example.com"), &department)
        .await
        .unwrap();
    assert_eq!(uow.save_changes().await.unwrap(), 2);

    let employees = uow.employees().get_all_with_departments().await.unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].id, ada.get().unwrap());
    assert_eq!(employees[0].name, "Ada");
    assert_eq!(employees[0].department_id, department.get());
    assert_eq!(employees[0].department.as_ref().unwrap().name, "Engineering");
}

#[tokio::test]
async fn adding_to_a_department_from_another_session_is_refused() {
    let store = store();
    let other = UnitOfWork::new(store.clone());
    let department = other.departments().add(Department::new("Engineering", "ENG")).await;

    let uow = UnitOfWork::new(store.clone());
    let err = uow
        .employees()
        .add_to_department(Employee::new("Ada", "ada@example.com"), &department)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
    assert_eq!(uow.pending_changes(), 0);

    other.save_changes().await.unwrap();
    uow.employees()
        .add_to_department(Employee::new("Ada", "ada@example.com"), &department)
        .await
        .unwrap();
    uow.save_changes().await.unwrap();
    let ada = &store.list_employees(None).await.unwrap()[0];
    assert_eq!(ada.department_id, department.get());
}

#[tokio::test]
async fn staged_inserts_are_listed_before_commit() {
    let store = store();
    seed_employees(&store, &["Grace Hopper"]).await;

    let uow = UnitOfWork::new(store.clone());
    let department = uow.departments().add(Department::new("Engineering", "ENG")).await;
    uow.employees()
        .add_to_department(Employee::new("Ada Lovelace", "ada@example.com"), &department)
        .await
        .unwrap();
    uow.employees().add(Employee::new("Linus", "linus@example.com")).await;

    let names = |list: Vec<Employee>| list.into_iter().map(|e| e.name).collect::<Vec<_>>();
    assert_eq!(
        names(uow.employees().get_all(None).await.unwrap()),
        vec!["Grace Hopper", "Ada Lovelace", "Linus"]
    );
    assert_eq!(names(uow.employees().get_all(Some("LOVE")).await.unwrap()), vec!["Ada Lovelace"]);

    let eager = uow.employees().get_all_with_departments().await.unwrap();
    assert_eq!(eager[1].id, 0);
    assert_eq!(eager[1].department.as_ref().unwrap().name, "Engineering");
    assert!(eager[2].department.is_none());

    let departments = uow.departments().get_all().await.unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].name, "Engineering");

    let outsider = UnitOfWork::new(store.clone());
    assert_eq!(outsider.employees().get_all(None).await.unwrap().len(), 1);
    assert!(outsider.departments().get_all().await.unwrap().is_empty());

    assert_eq!(uow.save_changes().await.unwrap(), 3);
    let committed = uow.employees().get_all(None).await.unwrap();
    assert_eq!(committed.len(), 3);
    assert!(committed.iter().all(|e| e.id > 0));
}

#[tokio::test]
async fn deleting_a_referenced_department_is_rolled_back() {
    let store = store();
    let department_id = seed_department(&store, "Engineering").await;

    let uow = UnitOfWork::new(store.clone());
    let ada = uow.employees().add(Employee::new("Ada", "ada@example.com").in_department(department_id)).await;
    uow.save_changes().await.unwrap();
    let before = uow.employees().get(ada.get().unwrap()).await.unwrap().unwrap();

    let department = uow.departments().get(department_id).await.unwrap().unwrap();
    uow.departments().delete(&department);
    let err = uow.save_changes().await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));

    let after = uow.employees().get(before.id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert!(uow.departments().get(department_id).await.unwrap().is_some());
}

#[tokio::test]
async fn departments_list_in_insertion_order_and_load_their_employees() {
    let store = store();
    let engineering = seed_department(&store, "Engineering").await;
    seed_department(&store, "Accounting").await;
    seed_department(&store, "Marketing").await;

    let uow = UnitOfWork::new(store.clone());
    uow.employees().add(Employee::new("Ada", "ada@example.com").in_department(engineering)).await;
    uow.employees().add(Employee::new("Grace", "grace@example.com")).await;
    uow.save_changes().await.unwrap();

    let names: Vec<String> = uow.departments().get_all().await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Engineering", "Accounting", "Marketing"]);

    let department = uow.departments().get_with_employees(engineering).await.unwrap().unwrap();
    let members = department.employees.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Ada");
    assert!(uow.departments().get(engineering).await.unwrap().unwrap().employees.is_none());
}

#[tokio::test]
async fn separate_units_of_work_do_not_share_staged_changes() {
    let store = store();
    let first = UnitOfWork::new(store.clone());
    let second = UnitOfWork::new(store.clone());

    first.departments().add(Department::new("Engineering", "ENG")).await;
    assert_eq!(second.save_changes().await.unwrap(), 0);
    assert!(store.list_departments().await.unwrap().is_empty());

    drop(first);
    assert!(store.list_departments().await.unwrap().is_empty());
}
