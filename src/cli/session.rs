//! `gatherly session` - 管理本地保存的凭证

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use dialoguer::Password;
use serde::Serialize;

use crate::session::{Session, SessionFile};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// 保存用户 ID 和 bearer token
    Set {
        /// 后端用户 ID
        #[arg(long)]
        user_id: String,
        /// Bearer token（省略时交互输入）
        #[arg(long)]
        token: Option<String>,
    },
    /// 显示当前会话
    Show {
        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },
    /// 清除会话
    Clear,
}

#[derive(Debug, Serialize)]
struct SessionOutput<'a> {
    user_id: &'a str,
    token: String,
    path: String,
}

pub fn handle_session(args: SessionArgs, file: &SessionFile) -> Result<()> {
    match args.command {
        SessionCommand::Set { user_id, token } => {
            let token = match token {
                Some(token) => token,
                None => Password::new()
                    .with_prompt("Bearer token")
                    .interact()
                    .map_err(|e| anyhow!("Failed to read token: {}", e))?,
            };
            let session = Session::new(user_id, token)?;
            file.save(&session)?;
            println!("Session saved for user {}", session.user_id);
        }
        SessionCommand::Show { json } => match file.load()? {
            Some(session) => {
                let output = SessionOutput {
                    user_id: &session.user_id,
                    token: session.masked_token(),
                    path: file.path().display().to_string(),
                };
                if json {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("user_id: {}", output.user_id);
                    println!("token:   {}", output.token);
                    println!("file:    {}", output.path);
                }
            }
            None => println!("Not signed in"),
        },
        SessionCommand::Clear => {
            if file.clear()? {
                println!("Session cleared");
            } else {
                println!("No session stored");
            }
        }
    }
    Ok(())
}

/// 读取会话，未登录时提示如何设置
pub fn require_session(file: &SessionFile) -> Result<Session> {
    file.load()?
        .ok_or_else(|| anyhow!("Not signed in\nRun: gatherly session set --user-id <ID>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));

        let args = SessionArgs {
            command: SessionCommand::Set {
                user_id: "u1".to_string(),
                token: Some("tok".to_string()),
            },
        };
        handle_session(args, &file).unwrap();
        assert_eq!(require_session(&file).unwrap().user_id, "u1");

        handle_session(SessionArgs { command: SessionCommand::Clear }, &file).unwrap();
        assert!(require_session(&file).is_err());
    }

    #[test]
    fn test_set_rejects_blank_token() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        let args = SessionArgs {
            command: SessionCommand::Set {
                user_id: "u1".to_string(),
                token: Some(" ".to_string()),
            },
        };
        assert!(handle_session(args, &file).is_err());
    }
}
