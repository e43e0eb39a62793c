use apiharness::http::{ApiRequest, Payload, Target};

fn target() -> Target {
    Target::new("http://example.com", "/search")
}

#[test]
fn test_query_params_storage() {
    let request = ApiRequest::get(target())
        .with_query("q", "search")
        .with_query("page", "1")
        .with_query("limit", "10");

    let params = request.payload.query_params();
    assert_eq!(params.len(), 3);
    assert_eq!(params[0], ("q".to_string(), "search".to_string()));
    assert_eq!(params[2], ("limit".to_string(), "10".to_string()));
}

#[test]
fn test_repeated_query_keys_are_kept() {
    let request = ApiRequest::get(target())
        .with_query("tag", "first")
        .with_query("tag", "second");

    let url = request
        .target
        .url()
        .unwrap()
        .to_request_url(request.payload.query_params())
        .unwrap();
    assert_eq!(url.query(), Some("tag=first&tag=second"));
}

#[test]
fn test_empty_query_params() {
    let request = ApiRequest::get(target());

    assert_eq!(request.payload, Payload::Empty);
    assert!(request.payload.query_params().is_empty());

    let url = request.target.url().unwrap().to_request_url(&[]).unwrap();
    assert_eq!(url.as_str(), "http://example.com/search");
}
