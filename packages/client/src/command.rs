//! Input line parsing for the CLI client.
//!
//! This module contains pure functions that implement input handling
//! without side effects, making them easy to test.

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Plain chat text
    Chat(String),
    /// `/mic N` - take mic slot N
    JoinMic(u8),
    /// `/unmic [N]` - release the held slot (optionally a specific one)
    LeaveMic(Option<u8>),
    /// `/slot NAME` - ask which slot NAME holds
    SlotOf(String),
    /// `/leave` - leave the room and exit
    Leave,
    /// `/help` - show the command list
    Help,
    /// Unrecognized or malformed command
    Invalid(String),
}

/// Parse one trimmed, non-empty input line
pub fn parse_input(line: &str) -> InputCommand {
    if !line.starts_with('/') {
        return InputCommand::Chat(line.to_string());
    }

    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/mic" => match rest.parse::<u8>() {
            Ok(slot) => InputCommand::JoinMic(slot),
            Err(_) => InputCommand::Invalid("usage: /mic <slot number>".to_string()),
        },
        "/unmic" => {
            if rest.is_empty() {
                InputCommand::LeaveMic(None)
            } else {
                match rest.parse::<u8>() {
                    Ok(slot) => InputCommand::LeaveMic(Some(slot)),
                    Err(_) => InputCommand::Invalid("usage: /unmic [slot number]".to_string()),
                }
            }
        }
        "/slot" => {
            if rest.is_empty() {
                InputCommand::Invalid("usage: /slot <user name>".to_string())
            } else {
                InputCommand::SlotOf(rest.to_string())
            }
        }
        "/leave" => InputCommand::Leave,
        "/help" => InputCommand::Help,
        other => InputCommand::Invalid(format!("unknown command: {other}")),
    }
}

/// Command list shown by `/help`
pub const HELP_TEXT: &str = "\
Commands:
  /mic <n>      take mic slot n
  /unmic [n]    release your mic slot (optionally slot n)
  /slot <name>  show which slot a user holds
  /leave        leave the room and exit
  /help         show this help
Anything else is sent as a chat message.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        // テスト項目: スラッシュで始まらない行がチャットとして扱われる
        // given (前提条件):
        let line = "hello everyone";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::Chat("hello everyone".to_string()));
    }

    #[test]
    fn test_mic_command_with_slot() {
        // テスト項目: /mic N がスロット番号付きで解析される
        // given (前提条件):
        let line = "/mic 3";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::JoinMic(3));
    }

    #[test]
    fn test_mic_command_without_slot_is_invalid() {
        // テスト項目: スロット番号なしの /mic が Invalid になる
        // given (前提条件):
        let line = "/mic";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert!(matches!(command, InputCommand::Invalid(_)));
    }

    #[test]
    fn test_unmic_without_slot() {
        // テスト項目: スロット番号なしの /unmic が None として解析される
        // given (前提条件):
        let line = "/unmic";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::LeaveMic(None));
    }

    #[test]
    fn test_unmic_with_slot() {
        // テスト項目: スロット番号付きの /unmic が Some として解析される
        // given (前提条件):
        let line = "/unmic 2";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::LeaveMic(Some(2)));
    }

    #[test]
    fn test_slot_command() {
        // テスト項目: /slot NAME がユーザー名付きで解析される
        // given (前提条件):
        let line = "/slot alice";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::SlotOf("alice".to_string()));
    }

    #[test]
    fn test_leave_command() {
        // テスト項目: /leave が解析される
        // given (前提条件):
        let line = "/leave";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert_eq!(command, InputCommand::Leave);
    }

    #[test]
    fn test_unknown_command_is_invalid() {
        // テスト項目: 未知のコマンドが Invalid になる
        // given (前提条件):
        let line = "/fly";

        // when (操作):
        let command = parse_input(line);

        // then (期待する結果):
        assert!(matches!(command, InputCommand::Invalid(_)));
    }
}
