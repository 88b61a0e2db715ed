use super::*;

#[test]
fn platform_parsing_accepts_supported_set() {
    assert_eq!(Platform::from_str("instagram"), Some(Platform::Instagram));
    assert_eq!(Platform::from_str("facebook"), Some(Platform::Facebook));
    assert_eq!(Platform::from_str("tiktok"), Some(Platform::Tiktok));
    assert_eq!(Platform::from_str("linkedin"), Some(Platform::Linkedin));
}

#[test]
fn platform_parsing_rejects_everything_else() {
    assert_eq!(Platform::from_str("twitter"), None);
    assert_eq!(Platform::from_str("Instagram"), None);
    assert_eq!(Platform::from_str(""), None);
}

#[test]
fn authorize_url_embeds_client_and_state() {
    let url = Platform::Instagram.authorize_url("client123", "https://app.example/api/auth/instagram/callback", "state456");
    assert!(url.starts_with("https://api.instagram.com/oauth/authorize?"));
    assert!(url.contains("client_id=client123"));
    assert!(url.contains("state=state456"));
    assert!(url.contains("response_type=code"));
}

#[test]
fn authorize_url_host_matches_platform() {
    let cases = [
        (Platform::Instagram, "api.instagram.com"),
        (Platform::Facebook, "www.facebook.com"),
        (Platform::Tiktok, "www.tiktok.com"),
        (Platform::Linkedin, "www.linkedin.com"),
    ];
    for (platform, host) in cases {
        let url = platform.authorize_url("id", "uri", "st");
        assert!(url.contains(host), "{url} should target {host}");
    }
}

#[test]
fn tiktok_uses_client_key_parameter() {
    let url = Platform::Tiktok.authorize_url("k", "uri", "st");
    assert!(url.contains("client_key=k"));
}

#[test]
fn env_bool_parses_common_forms() {
    // env_bool reads process env; exercise the parser through a scoped var.
    unsafe {
        std::env::set_var("ALKEBULAN_TEST_BOOL", "yes");
    }
    assert_eq!(env_bool("ALKEBULAN_TEST_BOOL"), Some(true));
    unsafe {
        std::env::set_var("ALKEBULAN_TEST_BOOL", "0");
    }
    assert_eq!(env_bool("ALKEBULAN_TEST_BOOL"), Some(false));
    unsafe {
        std::env::set_var("ALKEBULAN_TEST_BOOL", "maybe");
    }
    assert_eq!(env_bool("ALKEBULAN_TEST_BOOL"), None);
    unsafe {
        std::env::remove_var("ALKEBULAN_TEST_BOOL");
    }
}
