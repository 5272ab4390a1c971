use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use calendar_core::EventId;
use calendar_events::CalendarEventView;
use calendar_infra::QueryOutcome;

use crate::app::{dto, errors};
use crate::app::services::{run_calendar, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/query", get(query_events))
        .route("/sort", get(sorted_events))
        .route("/:id", put(update_event).delete(delete_event))
}

fn parse_id(raw: &str) -> Result<EventId, axum::response::Response> {
    raw.parse::<EventId>()
        .map_err(errors::domain_error_to_response)
}

fn read_body(
    body: Result<Json<dto::CalendarEventRequest>, JsonRejection>,
) -> Result<dto::CalendarEventRequest, axum::response::Response> {
    body.map(|Json(req)| req).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text())
    })
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CalendarEventRequest>, JsonRejection>,
) -> axum::response::Response {
    let view = match read_body(body).and_then(|req| {
        req.into_view().map_err(errors::domain_error_to_response)
    }) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_calendar(services, move |calendar| calendar.add(view)).await {
        Ok(created) => {
            let location = format!("/api/calendar/query?id={}", created.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(created),
            )
                .into_response()
        }
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CalendarEventRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let req = match read_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if req.id != id {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "id_mismatch",
            format!("path id {id} does not match body id {}", req.id),
        );
    }
    let view: CalendarEventView = match req.into_view() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let applied = view.clone();
    match run_calendar(services, move |calendar| calendar.update(id, &view)).await {
        Ok(true) => (StatusCode::OK, Json(applied)).into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "calendar event not found"),
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_calendar(services, move |calendar| calendar.delete(id)).await {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "calendar event not found"),
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn list_events(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match run_calendar(services, |calendar| calendar.get_all()).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn sorted_events(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match run_calendar(services, |calendar| calendar.get_all_sorted_by_time_descending()).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn query_events(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::CalendarQueryParams>,
) -> axum::response::Response {
    let filter = match params.into_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match run_calendar(services, move |calendar| calendar.query(&filter)).await {
        Ok(QueryOutcome::Single(Some(event))) => (StatusCode::OK, Json(event)).into_response(),
        Ok(QueryOutcome::Single(None)) | Ok(QueryOutcome::NoFilter) => StatusCode::NO_CONTENT.into_response(),
        Ok(QueryOutcome::Many(events)) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::run_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use calendar_events::CalendarEvent;
    use calendar_infra::store::{Change, EventField, EventStore, InMemoryEventStore, StoreError};

    use super::*;
    use crate::app;

    fn app() -> Router {
        app::router(Arc::new(AppServices::in_memory().unwrap()))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn event_json(name: &str, time: i64) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "time": time,
            "location": "HQ",
            "members": "ana,bo",
            "eventOrganizer": "ana",
        })
    }

    #[tokio::test]
    async fn create_returns_created_with_location() {
        let resp = app()
            .oneshot(json_request("POST", "/api/calendar", event_json("Standup", 10)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/api/calendar/query?id="));
    }

    #[tokio::test]
    async fn create_with_blank_name_is_bad_request() {
        let resp = app()
            .oneshot(json_request("POST", "/api/calendar", event_json("  ", 10)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_malformed_json_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/calendar")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_with_mismatched_ids_is_bad_request() {
        let mut body = event_json("Standup", 10);
        body["id"] = serde_json::json!(2);
        let resp = app()
            .oneshot(json_request("PUT", "/api/calendar/1", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_of_unknown_event_is_not_found() {
        let mut body = event_json("Standup", 10);
        body["id"] = serde_json::json!(5);
        let resp = app()
            .oneshot(json_request("PUT", "/api/calendar/5", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_with_non_numeric_id_is_bad_request() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/api/calendar/abc")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_without_params_is_no_content() {
        let req = Request::builder()
            .uri("/api/calendar/query")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn query_by_unknown_id_is_no_content() {
        let req = Request::builder()
            .uri("/api/calendar/query?id=42")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_without_time_is_bad_request() {
        let mut body = event_json("Standup", 10);
        body.as_object_mut().unwrap().remove("time");
        let resp = app()
            .oneshot(json_request("POST", "/api/calendar", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    /// Store that parks the calling thread on the runtime for every read, the
    /// way the Postgres store bridges its async queries.
    #[derive(Debug, Default)]
    struct BlockingBridgeStore {
        inner: InMemoryEventStore,
    }

    impl BlockingBridgeStore {
        fn wait(&self) {
            let handle = tokio::runtime::Handle::current();
            tokio::task::block_in_place(|| {
                handle.block_on(tokio::time::sleep(Duration::from_millis(20)))
            });
        }
    }

    impl EventStore for BlockingBridgeStore {
        fn next_id(&self) -> Result<EventId, StoreError> {
            self.inner.next_id()
        }

        fn get(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError> {
            self.wait();
            self.inner.get(id)
        }

        fn list(&self) -> Result<Vec<CalendarEvent>, StoreError> {
            self.wait();
            self.inner.list()
        }

        fn find_by(&self, field: EventField, value: &str) -> Result<Vec<CalendarEvent>, StoreError> {
            self.wait();
            self.inner.find_by(field, value)
        }

        fn find_first_by(&self, field: EventField, value: &str) -> Result<Option<CalendarEvent>, StoreError> {
            self.wait();
            self.inner.find_first_by(field, value)
        }

        fn list_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError> {
            self.wait();
            self.inner.list_by_time_desc()
        }

        fn commit(&self, changes: Vec<Change>) -> Result<usize, StoreError> {
            self.wait();
            self.inner.commit(changes)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_over_blocking_store_all_complete() {
        let services = AppServices::new(Arc::new(BlockingBridgeStore::default()), "bridge").unwrap();
        let router = app::router(Arc::new(services));

        let requests = (0..8).map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                let req = Request::builder().uri("/api/calendar").body(Body::empty()).unwrap();
                router.oneshot(req).await.unwrap().status()
            })
        });
        let all = join_statuses(requests.collect());

        let statuses = tokio::time::timeout(Duration::from_secs(10), all)
            .await
            .expect("concurrent requests did not complete");
        assert_eq!(statuses.len(), 8);
        assert!(statuses.iter().all(|s| *s == StatusCode::OK));
    }

    async fn join_statuses(handles: Vec<tokio::task::JoinHandle<StatusCode>>) -> Vec<StatusCode> {
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }
        statuses
    }
}
