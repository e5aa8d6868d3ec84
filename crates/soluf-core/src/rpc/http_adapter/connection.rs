use std::path::Path;

use reqwest::Url;

use crate::error::CoreError;

/// Resolve basic-auth credentials.
///
/// Precedence: explicit `user` + `pass`, then a `username:password` cookie
/// file, then no auth. Setting only one of `user`/`pass` is rejected.
pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
    cookie_file: Option<&Path>,
) -> Result<Option<(String, String)>, CoreError> {
    match (user, pass) {
        (Some(u), Some(p)) => return Ok(Some((u.to_owned(), p.to_owned()))),
        (Some(_), None) | (None, Some(_)) => {
            return Err(CoreError::Config(
                "both rpc user and rpc pass must be set together".to_owned(),
            ));
        }
        (None, None) => {}
    }

    let Some(cookie_file) = cookie_file else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(cookie_file).map_err(|e| {
        CoreError::Config(format!(
            "failed to read rpc cookie file {}: {e}",
            cookie_file.display()
        ))
    })?;
    let line = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            CoreError::Config(format!(
                "rpc cookie file {} is empty",
                cookie_file.display()
            ))
        })?;

    let (cookie_user, cookie_pass) = line.split_once(':').ok_or_else(|| {
        CoreError::Config(format!(
            "rpc cookie file {} must contain `username:password`",
            cookie_file.display()
        ))
    })?;
    if cookie_user.is_empty() || cookie_pass.is_empty() {
        return Err(CoreError::Config(format!(
            "rpc cookie file {} must contain non-empty `username:password`",
            cookie_file.display()
        )));
    }

    Ok(Some((cookie_user.to_owned(), cookie_pass.to_owned())))
}

pub(super) fn parse_endpoint(endpoint: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(endpoint).map_err(|e| {
        CoreError::Config(format!(
            "invalid rpc endpoint `{endpoint}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CoreError::Config(format!(
            "unsupported rpc endpoint scheme `{other}`; expected http or https"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_cookie_path(tag: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time must be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("soluf-core-{tag}-{unique}.cookie"))
    }

    #[test]
    fn parse_endpoint_https_url_with_token_path() {
        let parsed =
            parse_endpoint("https://node.example.com/4c2f115e").expect("https endpoint must parse");
        assert_eq!(parsed.path(), "/4c2f115e");
    }

    #[test]
    fn parse_endpoint_invalid_scheme() {
        let err = parse_endpoint("ftp://example.com").expect_err("must reject ftp");
        assert!(err.to_string().contains("unsupported rpc endpoint scheme"));
    }

    #[test]
    fn parse_endpoint_garbage() {
        let err = parse_endpoint("not a url").expect_err("must reject garbage");
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn resolve_auth_rejects_partial_credentials() {
        let err = resolve_auth(None, Some("secret"), None).expect_err("must reject partial auth");
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn resolve_auth_explicit_credentials_win_over_cookie() {
        let missing = temp_cookie_path("unused");
        let auth =
            resolve_auth(Some("alice"), Some("secret"), Some(&missing)).expect("auth must parse");
        assert_eq!(auth, Some(("alice".to_owned(), "secret".to_owned())));
    }

    #[test]
    fn resolve_auth_reads_cookie_file() {
        let cookie_path = temp_cookie_path("cookie");
        fs::write(&cookie_path, "__cookie__:token\n").expect("cookie file must be writable");

        let auth = resolve_auth(None, None, Some(&cookie_path)).expect("cookie must parse");
        assert_eq!(auth, Some(("__cookie__".to_owned(), "token".to_owned())));

        let _ = fs::remove_file(cookie_path);
    }

    #[test]
    fn resolve_auth_rejects_cookie_without_separator() {
        let cookie_path = temp_cookie_path("bad");
        fs::write(&cookie_path, "justtoken\n").expect("cookie file must be writable");

        let err = resolve_auth(None, None, Some(&cookie_path)).expect_err("must reject");
        assert!(err.to_string().contains("username:password"));

        let _ = fs::remove_file(cookie_path);
    }

    #[test]
    fn resolve_auth_none_without_inputs() {
        assert_eq!(resolve_auth(None, None, None).expect("no auth is fine"), None);
    }
}
