//! 推送通道地址推导

use thiserror::Error;
use url::Url;

use crate::session::Session;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushUrlError {
    #[error("invalid backend address: {0}")]
    Invalid(String),

    #[error("unsupported scheme: {0}")]
    Scheme(String),
}

/// `<ws-scheme>://<host>/<base path>/notifications/ws/{user_id}?token={bearer}`
///
/// 不是所有客户端都能在握手时带 `Authorization` 头，
/// 所以 bearer 凭证放在查询参数里。
pub fn push_url(api_url: &str, session: &Session) -> Result<Url, PushUrlError> {
    let mut url = Url::parse(api_url.trim()).map_err(|e| PushUrlError::Invalid(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(PushUrlError::Scheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| PushUrlError::Scheme(scheme.to_string()))?;

    let base = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/notifications/ws/", base));
    url.path_segments_mut()
        .map_err(|_| PushUrlError::Invalid(api_url.to_string()))?
        .pop()
        .push(&session.user_id);

    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut().append_pair("token", &session.token);
    Ok(url)
}
