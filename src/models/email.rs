use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}
