use std::fs;
use std::path::Path;

use pillsprint_agent::ChatTurn;
use pillsprint_core::config::LoadOptions;

use crate::commands::bootstrap::bootstrap;
use crate::commands::{execute, load_config, CommandResult};

/// One chat turn. `history` is an optional JSON file holding earlier turns as
/// `[{"role": "user" | "model", "content": "..."}]`.
pub fn run(options: LoadOptions, message: &str, history: Option<&Path>) -> CommandResult {
    let history = match history.map(read_history).transpose() {
        Ok(history) => history.unwrap_or_default(),
        Err(error) => return CommandResult::failure("chat", "invalid_history", error, 2),
    };
    let config = match load_config("chat", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    execute("chat", async move {
        let app = bootstrap(config).await?;
        let reply = app.agent.medical_chat(message, &history).await;
        app.shutdown().await;
        Ok(CommandResult::rendered(reply))
    })
}

fn read_history(path: &Path) -> Result<Vec<ChatTurn>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read history `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("history `{}` is not a list of turns: {error}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pillsprint_agent::{ChatRole, ChatTurn};

    use super::read_history;

    #[test]
    fn history_accepts_assistant_alias() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"role": "user", "content": "hi"}, {"role": "assistant", "content": "Hello!"}]"#,
        )
        .expect("write");

        let history = read_history(&path).expect("history");

        assert_eq!(history, vec![ChatTurn::user("hi"), ChatTurn::model("Hello!")]);
        assert_eq!(history[1].role, ChatRole::Model);
    }

    #[test]
    fn malformed_history_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{"role": "user"}"#).expect("write");

        let error = read_history(&path).expect_err("must fail");

        assert!(error.contains("not a list of turns"));
    }
}
