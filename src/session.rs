//! 登录会话 - 用户身份与 bearer 凭证
//!
//! 会话显式传给客户端和通道，
//! CLI 多次运行之间的持久化由 `SessionFile` 负责。

use anyhow::{bail, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::config_dir;

/// 已登录用户
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into().trim().to_string();
        let token = token.into().trim().to_string();
        if user_id.is_empty() {
            bail!("user_id is required");
        }
        if token.is_empty() {
            bail!("token is required");
        }
        Ok(Self { user_id, token })
    }

    /// 只显示末四位的 token
    pub fn masked_token(&self) -> String {
        let visible: String = self
            .token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", visible)
    }
}

// 日志里不出现凭证
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &self.masked_token())
            .finish()
    }
}

/// 以 JSON 持久化的会话，读写加文件锁
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/gatherly/session.json`
    pub fn default_location() -> Self {
        Self::new(config_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取会话，未登录时返回 `None`
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&self.path)?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        file.unlock()?;
        read?;

        if content.trim().is_empty() {
            return Ok(None);
        }
        let stored: Session = serde_json::from_str(&content)?;
        // 文件可能被手工改过，重新走一遍 Session::new 的校验
        match Session::new(stored.user_id, stored.token) {
            Ok(session) => {
                debug!(user_id = %session.user_id, "Loaded session");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring incomplete session file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // 新建文件时就是 0600，token 不会有可读窗口
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // 已存在的文件不受 mode() 影响，写入前先收紧权限
        restrict_permissions(&self.path)?;
        file.lock_exclusive()?;

        let result = (|| -> Result<()> {
            file.set_len(0)?;
            file.write_all(serde_json::to_string_pretty(session)?.as_bytes())?;
            file.flush()?;
            Ok(())
        })();
        file.unlock()?;
        result?;

        debug!(user_id = %session.user_id, path = %self.path.display(), "Saved session");
        Ok(())
    }

    /// 删除会话文件，存在时返回 `true`
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_requires_fields() {
        assert!(Session::new("", "tok").is_err());
        assert!(Session::new("u1", "  ").is_err());
        let s = Session::new(" u1 ", " abc ").unwrap();
        assert_eq!(s.user_id, "u1");
        assert_eq!(s.token, "abc");
    }

    #[test]
    fn test_debug_masks_token() {
        let s = Session::new("u1", "secret-token-1234").unwrap();
        let printed = format!("{:?}", s);
        assert!(printed.contains("u1"));
        assert!(printed.contains("****1234"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));

        assert!(file.load().unwrap().is_none());

        let session = Session::new("u1", "tok-1").unwrap();
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        // 更短的内容不能残留旧字节
        let shorter = Session::new("u", "t").unwrap();
        file.save(&shorter).unwrap();
        assert_eq!(file.load().unwrap(), Some(shorter));

        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_blank_credentials_on_disk_mean_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);

        fs::write(&path, r#"{"user_id":"","token":"   "}"#).unwrap();
        assert!(file.load().unwrap().is_none());

        fs::write(&path, r#"{"user_id":"u1","token":""}"#).unwrap();
        assert!(file.load().unwrap().is_none());

        // 合法内容照样会被 trim
        fs::write(&path, r#"{"user_id":" u1 ","token":" tok "}"#).unwrap();
        assert_eq!(file.load().unwrap(), Some(Session::new("u1", "tok").unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);

        file.save(&Session::new("u1", "tok").unwrap()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        // 预先存在且权限过宽的文件也会被收紧
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        file.save(&Session::new("u1", "tok2").unwrap()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
