use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub available_courses: Vec<String>,
}
