//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use todo_core::{
    ApiError, AuthResponse, HttpMethod, HttpRequest, HttpResponse, Login, Registration, TodoClient,
    TodoItem,
};

const BASE_URL: &str = "http://localhost:3000";
const API_KEY: &str = "test-key";

fn client() -> TodoClient {
    TodoClient::new(BASE_URL, API_KEY)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn str_field<'a>(case: &'a serde_json::Value, key: &str) -> &'a str {
    case[key].as_str().unwrap()
}

/// Check method, path, query, headers and (if present) body.
fn assert_request(name: &str, req: &HttpRequest, expected: &serde_json::Value) {
    assert_eq!(req.method, parse_method(str_field(expected, "method")), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", str_field(expected, "path")), "{name}: path");
    assert_eq!(req.query, pairs(&expected["query"]), "{name}: query");
    assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let actual: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: str_field(sim, "body").to_string(),
    }
}

/// Match an error against `expected_error`: either `{"status": n}` or `{"kind": "..."}`.
fn assert_error(name: &str, err: ApiError, expected: &serde_json::Value) {
    if let Some(status) = expected.get("status") {
        assert_eq!(err.status(), Some(status.as_u64().unwrap() as u16), "{name}: status");
        return;
    }
    match str_field(expected, "kind") {
        "Deserialization" => {
            assert!(matches!(err, ApiError::Deserialization(_)), "{name}: expected Deserialization")
        }
        other => panic!("{name}: unknown expected_error kind: {other}"),
    }
}

fn cases(raw: &str) -> Vec<serde_json::Value> {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/list.json")) {
        let name = str_field(&case, "name");

        let req = c.build_list_todos(str_field(&case, "user_id"), str_field(&case, "token"));
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_list_todos(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<TodoItem> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/create.json")) {
        let name = str_field(&case, "name");
        let input: TodoItem = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c
            .build_create_todo(str_field(&case, "user_id"), str_field(&case, "token"), &input)
            .unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let todo = c.parse_todo(simulated(&case)).unwrap();
        let expected: TodoItem = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(todo, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/update.json")) {
        let name = str_field(&case, "name");
        let input: TodoItem = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c
            .build_update_todo(
                str_field(&case, "user_id"),
                str_field(&case, "todo_id"),
                str_field(&case, "token"),
                &input,
            )
            .unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_todo(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: TodoItem = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/delete.json")) {
        let name = str_field(&case, "name");

        let req = c.build_delete_todo(
            str_field(&case, "user_id"),
            str_field(&case, "todo_id"),
            str_field(&case, "token"),
        );
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_todo(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}

// ---------------------------------------------------------------------------
// Register / login
// ---------------------------------------------------------------------------

#[test]
fn auth_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/auth.json")) {
        let name = str_field(&case, "name");

        let req = match str_field(&case, "operation") {
            "register" => {
                let input: Registration = serde_json::from_value(case["input"].clone()).unwrap();
                c.build_register(&input).unwrap()
            }
            "login" => {
                let input: Login = serde_json::from_value(case["input"].clone()).unwrap();
                c.build_login(&input).unwrap()
            }
            other => panic!("{name}: unknown operation: {other}"),
        };
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_auth(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: AuthResponse = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}
