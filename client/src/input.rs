//! Terminal input handling: command parsing and per-frame movement sampling.

use shared::{PlayerColor, Vec3};

/// Distance covered per 16ms frame while a direction is held.
const MOVE_STEP: f32 = 0.1;
/// Degrees turned per 16ms frame while turning is held.
const TURN_STEP: f32 = 3.0;

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Chat(String),
    Ready(bool),
    Name(String),
    Move(Vec3),
    Stop,
    Rotate(f32),
    Color(PlayerColor),
    Reload,
    Start,
    Kick(u64),
    Roster,
    Quit,
}

/// Parses one line from the terminal. Lines starting with `/` are
/// commands; anything else is chat (including whispers, which the
/// authority recognizes by their leading `@`).
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if !trimmed.starts_with('/') {
        return Ok(Some(Command::Chat(trimmed.to_string())));
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts.next().unwrap_or("");

    match verb {
        "/ready" => Ok(Some(Command::Ready(true))),
        "/unready" => Ok(Some(Command::Ready(false))),
        "/name" => match parts.next() {
            Some(name) if parts.next().is_none() => Ok(Some(Command::Name(name.to_string()))),
            _ => Err("Usage: /name <newname>".to_string()),
        },
        "/move" => {
            let dir = parts.next().ok_or("Usage: /move <n|s|e|w>")?;
            let step = match dir {
                "n" => Vec3::new(0.0, 0.0, MOVE_STEP),
                "s" => Vec3::new(0.0, 0.0, -MOVE_STEP),
                "e" => Vec3::new(MOVE_STEP, 0.0, 0.0),
                "w" => Vec3::new(-MOVE_STEP, 0.0, 0.0),
                other => return Err(format!("Unknown direction: {}", other)),
            };
            Ok(Some(Command::Move(step)))
        }
        "/stop" => Ok(Some(Command::Stop)),
        "/turn" => {
            let deg: f32 = parts
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or("Usage: /turn <degrees per frame>")?;
            Ok(Some(Command::Rotate(deg.clamp(-TURN_STEP * 10.0, TURN_STEP * 10.0))))
        }
        "/color" => {
            let name = parts.next().ok_or("Usage: /color <black|blue|green|yellow|magenta>")?;
            match PlayerColor::parse(name) {
                Some(color) => Ok(Some(Command::Color(color))),
                None => Err(format!("Unknown color: {}", name)),
            }
        }
        "/reload" => Ok(Some(Command::Reload)),
        "/start" => Ok(Some(Command::Start)),
        "/kick" => {
            let target: u64 = parts
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or("Usage: /kick <participant id>")?;
            Ok(Some(Command::Kick(target)))
        }
        "/roster" => Ok(Some(Command::Roster)),
        "/quit" => Ok(Some(Command::Quit)),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Held movement state, sampled once per frame.
///
/// Each frame produces at most one movement delta and one rotation delta.
/// When movement stops, a single zero delta is emitted so the authority
/// can settle the player back to idle.
pub struct ControlState {
    move_step: Vec3,
    turn_step: f32,
    was_moving: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            move_step: Vec3::ZERO,
            turn_step: 0.0,
            was_moving: false,
        }
    }

    pub fn set_move(&mut self, step: Vec3) {
        self.move_step = step;
    }

    pub fn stop(&mut self) {
        self.move_step = Vec3::ZERO;
        self.turn_step = 0.0;
    }

    pub fn set_turn(&mut self, degrees_per_frame: f32) {
        self.turn_step = degrees_per_frame;
    }

    /// Samples the held state for one frame.
    pub fn frame_sample(&mut self) -> (Option<Vec3>, Option<Vec3>) {
        let moving = !self.move_step.is_zero();

        let move_delta = if moving {
            self.was_moving = true;
            Some(self.move_step)
        } else if self.was_moving {
            self.was_moving = false;
            Some(Vec3::ZERO)
        } else {
            None
        };

        let turn_delta = if self.turn_step != 0.0 {
            Some(Vec3::new(0.0, self.turn_step, 0.0))
        } else {
            None
        };

        (move_delta, turn_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse_line("hello there").unwrap(),
            Some(Command::Chat("hello there".to_string()))
        );
        // Whispers pass through as chat; the authority owns the grammar.
        assert_eq!(
            parse_line("@2 psst").unwrap(),
            Some(Command::Chat("@2 psst".to_string()))
        );
    }

    #[test]
    fn test_empty_line_is_nothing() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_ready_commands() {
        assert_eq!(parse_line("/ready").unwrap(), Some(Command::Ready(true)));
        assert_eq!(parse_line("/unready").unwrap(), Some(Command::Ready(false)));
    }

    #[test]
    fn test_name_command_requires_single_token() {
        assert_eq!(
            parse_line("/name abc123").unwrap(),
            Some(Command::Name("abc123".to_string()))
        );
        assert!(parse_line("/name").is_err());
        assert!(parse_line("/name two words").is_err());
    }

    #[test]
    fn test_move_directions() {
        match parse_line("/move n").unwrap() {
            Some(Command::Move(step)) => assert!(step.z > 0.0),
            other => panic!("Expected Move, got {:?}", other),
        }
        assert!(parse_line("/move up").is_err());
        assert_eq!(parse_line("/stop").unwrap(), Some(Command::Stop));
    }

    #[test]
    fn test_color_command() {
        assert_eq!(
            parse_line("/color green").unwrap(),
            Some(Command::Color(PlayerColor::Green))
        );
        assert!(parse_line("/color gray").is_err());
        assert!(parse_line("/color").is_err());
    }

    #[test]
    fn test_reload_command() {
        assert_eq!(parse_line("/reload").unwrap(), Some(Command::Reload));
    }

    #[test]
    fn test_kick_requires_numeric_id() {
        assert_eq!(parse_line("/kick 3").unwrap(), Some(Command::Kick(3)));
        assert!(parse_line("/kick bob").is_err());
        assert!(parse_line("/kick").is_err());
    }

    #[test]
    fn test_unknown_command_is_error() {
        assert!(parse_line("/dance").is_err());
    }

    #[test]
    fn test_frame_sample_emits_single_trailing_zero() {
        let mut controls = ControlState::new();
        controls.set_move(Vec3::new(0.1, 0.0, 0.0));

        let (first, _) = controls.frame_sample();
        assert_eq!(first, Some(Vec3::new(0.1, 0.0, 0.0)));

        controls.stop();
        let (stop_frame, _) = controls.frame_sample();
        assert_eq!(stop_frame, Some(Vec3::ZERO));

        // Fully idle frames stay silent.
        let (idle_frame, turn) = controls.frame_sample();
        assert_eq!(idle_frame, None);
        assert_eq!(turn, None);
    }

    #[test]
    fn test_frame_sample_turn_is_independent() {
        let mut controls = ControlState::new();
        controls.set_turn(3.0);

        let (move_delta, turn_delta) = controls.frame_sample();
        assert_eq!(move_delta, None);
        assert_eq!(turn_delta, Some(Vec3::new(0.0, 3.0, 0.0)));
    }
}
