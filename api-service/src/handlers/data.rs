use axum::extract::State;
use axum::Json;
use http_server::ServiceContext;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct DataItem {
    pub id: u32,
    pub name: &'static str,
    pub value: u32,
}

#[derive(Debug, Serialize)]
pub struct DataList {
    pub data: Vec<DataItem>,
    pub total: usize,
    pub timestamp: String,
}

const SAMPLE_DATA: [DataItem; 2] = [
    DataItem {
        id: 1,
        name: "Sample Data 1",
        value: 100,
    },
    DataItem {
        id: 2,
        name: "Sample Data 2",
        value: 200,
    },
];

pub async fn list_data(State(ctx): State<ServiceContext>) -> Json<DataList> {
    let data = SAMPLE_DATA.to_vec();
    Json(DataList {
        total: data.len(),
        data,
        timestamp: ctx.timesource.current_time(),
    })
}
