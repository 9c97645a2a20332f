use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServeRequest {
    pub meal_id: i64,
    pub portions: i32,
}
