use super::*;

fn headers_with_key(key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SERVICE_KEY_HEADER, key.parse().unwrap());
    headers
}

#[test]
fn unset_key_is_a_configuration_fault_not_unauthorized() {
    let err = check_service_key(None, &headers_with_key("anything")).unwrap_err();
    assert!(matches!(err, ApiError::NotConfigured(_)));
}

#[test]
fn missing_header_is_unauthorized() {
    let err = check_service_key(Some("secret"), &HeaderMap::new()).unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[test]
fn wrong_key_is_unauthorized() {
    let err = check_service_key(Some("secret"), &headers_with_key("wrong")).unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[test]
fn matching_key_passes() {
    assert!(check_service_key(Some("secret"), &headers_with_key("secret")).is_ok());
}

#[test]
fn config_check_precedes_auth_check() {
    // Even a caller presenting no key at all sees the 500, not a 401, when
    // the server itself is misconfigured.
    let err = check_service_key(None, &HeaderMap::new()).unwrap_err();
    assert!(matches!(err, ApiError::NotConfigured(_)));
}

#[test]
fn missing_user_id_is_validation() {
    let err = parse_user_id(&ActivateMentorBody { user_id: None }).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn malformed_user_id_is_validation() {
    let err = parse_user_id(&ActivateMentorBody { user_id: Some("not-a-uuid".into()) }).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn well_formed_user_id_parses() {
    let id = Uuid::new_v4();
    let parsed = parse_user_id(&ActivateMentorBody { user_id: Some(id.to_string()) }).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn body_deserializes_camel_case() {
    let body: ActivateMentorBody = serde_json::from_str(r#"{"userId":"abc"}"#).unwrap();
    assert_eq!(body.user_id.as_deref(), Some("abc"));
}
