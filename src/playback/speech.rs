//! Speech boundary. At most one utterance is ever in flight per engine.

use std::io::Write;
use std::process::{Child, Command, Stdio};

pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);
pub const PITCH_RANGE: (f32, f32) = (0.5, 2.0);
/// Longest text passed as a command-line argument. Linux refuses single
/// arguments above 128 KiB; longer texts go to the engine on stdin.
pub const MAX_ARG_TEXT: usize = 64 * 1024;

const EDGE_STDIN_ARGS: &[&str] = &["--file", "/dev/stdin"];
const ESPEAK_STDIN_ARGS: &[&str] = &["--stdin"];
const SAY_STDIN_ARGS: &[&str] = &["-f", "-"];
/// Other programs get the text on stdin with no extra flag.
const PLAIN_STDIN_ARGS: &[&str] = &[];

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<String>,
}

/// Rate, pitch and voice applied to every utterance a scheduler issues.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub rate: f32,
    pub pitch: f32,
    pub name: Option<String>,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            name: None,
        }
    }
}

impl Voice {
    pub fn utterance(&self, text: impl Into<String>) -> Utterance {
        Utterance {
            text: text.into(),
            rate: clamp_unit(self.rate, RATE_RANGE),
            pitch: clamp_unit(self.pitch, PITCH_RANGE),
            voice: self.name.clone().filter(|name| !name.trim().is_empty()),
        }
    }
}

fn clamp_unit(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() { 1.0 } else { value.clamp(min, max) }
}

/// Fire-and-forget speech output.
pub trait Speech {
    /// Start speaking. Implementations cancel whatever was still playing.
    ///
    /// Returns whether an utterance is now playing.
    fn speak(&mut self, utterance: &Utterance) -> bool;
    fn cancel(&mut self);
    fn is_speaking(&mut self) -> bool;
}

impl<S: Speech + ?Sized> Speech for Box<S> {
    fn speak(&mut self, utterance: &Utterance) -> bool {
        (**self).speak(utterance)
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }

    fn is_speaking(&mut self) -> bool {
        (**self).is_speaking()
    }
}

/// Speech sink that never makes a sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

impl Speech for SilentSpeech {
    fn speak(&mut self, _utterance: &Utterance) -> bool {
        false
    }

    fn cancel(&mut self) {}

    fn is_speaking(&mut self) -> bool {
        false
    }
}

/// Speaks through an external TTS program.
///
/// `engine` is `edge-playback` (the default when empty), `espeak`, `say`,
/// a command template where `{}` is replaced by the text, or any other
/// program that takes the text as its last argument. Texts longer than
/// [`MAX_ARG_TEXT`] are written to the engine's stdin instead; templates
/// cannot take them.
#[derive(Debug)]
pub struct CommandSpeech {
    engine: String,
    child: Option<Child>,
}

impl CommandSpeech {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            child: None,
        }
    }
}

/// A ready-to-spawn engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Text to write to the engine's stdin, for texts too long for argv
    pub stdin: Option<String>,
}

/// Invocation that speaks `utterance` with `engine`.
pub fn engine_command(engine: &str, utterance: &Utterance) -> Option<EngineCommand> {
    let engine = engine.trim();
    let text = utterance.text.clone();
    let voice = utterance.voice.clone();
    let long = text.len() > MAX_ARG_TEXT;

    let (program, mut args, stdin_args) = if engine.is_empty() || engine == "edge-playback" {
        let mut args = vec![format!(
            "--rate={:+}%",
            ((utterance.rate - 1.0) * 100.0).round() as i32
        )];
        if let Some(voice) = voice {
            args.extend(["--voice".to_string(), voice]);
        }
        ("edge-playback", args, EDGE_STDIN_ARGS)
    } else if engine == "espeak" {
        let mut args = vec![
            "-s".to_string(),
            ((175.0 * utterance.rate).round() as u32).to_string(),
            "-p".to_string(),
            ((50.0 * utterance.pitch).round().min(99.0) as u32).to_string(),
        ];
        if let Some(voice) = voice {
            args.extend(["-v".to_string(), voice]);
        }
        ("espeak", args, ESPEAK_STDIN_ARGS)
    } else if engine == "say" {
        let mut args = vec![
            "-r".to_string(),
            ((175.0 * utterance.rate).round() as u32).to_string(),
        ];
        if let Some(voice) = voice {
            args.extend(["-v".to_string(), voice]);
        }
        ("say", args, SAY_STDIN_ARGS)
    } else if engine.contains("{}") {
        if long {
            return None;
        }
        // The text is substituted as a single argument so it is never
        // re-split on its own whitespace.
        let mut parts = engine.split_whitespace();
        let program = parts.next()?;
        let args = parts.map(|part| part.replace("{}", &text)).collect();
        return Some(EngineCommand {
            program: program.to_string(),
            args,
            stdin: None,
        });
    } else {
        (engine, Vec::new(), PLAIN_STDIN_ARGS)
    };

    if long {
        args.extend(stdin_args.iter().map(|arg| arg.to_string()));
        return Some(EngineCommand {
            program: program.to_string(),
            args,
            stdin: Some(text),
        });
    }
    if program == "edge-playback" {
        args.push("--text".to_string());
    }
    args.push(text);
    Some(EngineCommand {
        program: program.to_string(),
        args,
        stdin: None,
    })
}

impl Speech for CommandSpeech {
    fn speak(&mut self, utterance: &Utterance) -> bool {
        self.cancel();
        if utterance.text.trim().is_empty() {
            return false;
        }
        let Some(command) = engine_command(&self.engine, utterance) else {
            log::warn!(
                "TTS engine {:?} cannot speak this text ({} bytes)",
                self.engine,
                utterance.text.len()
            );
            return false;
        };
        let EngineCommand {
            program,
            args,
            stdin,
        } = command;

        let mut cmd = Command::new(&program);
        cmd.args(&args).stdout(Stdio::null()).stderr(Stdio::null());
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        // Own process group, so cancel() also reaches players the engine
        // spawns (edge-playback runs mpv).
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                log::warn!("TTS failed to start {program}: {err}");
                return false;
            }
        };
        log::debug!("TTS {} started (pid {})", program, child.id());

        // The engine reads while it speaks, so the pipe is fed from a
        // thread. A cancelled engine closes it and the write fails.
        if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
            std::thread::spawn(move || {
                if let Err(err) = pipe.write_all(text.as_bytes()) {
                    log::debug!("TTS stdin closed early: {err}");
                }
            });
        }
        self.child = Some(child);
        true
    }

    fn cancel(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        #[cfg(unix)]
        unsafe {
            libc::kill(-(child.id() as i32), libc::SIGKILL);
        }
        let _ = child.kill();
        let _ = child.wait();
    }

    fn is_speaking(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => {
                self.child = None;
                false
            }
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(text: &str) -> Utterance {
        Voice::default().utterance(text)
    }

    #[test]
    fn test_voice_clamps_rate_and_pitch() {
        let voice = Voice {
            rate: 5.0,
            pitch: 0.1,
            name: Some("  ".to_string()),
        };
        let utterance = voice.utterance("hi");
        assert_eq!(utterance.rate, 2.0);
        assert_eq!(utterance.pitch, 0.5);
        assert_eq!(utterance.voice, None);
    }

    #[test]
    fn test_engine_command_defaults_to_edge_playback() {
        let command = engine_command("", &utterance("hello there")).unwrap();
        assert_eq!(command.program, "edge-playback");
        assert_eq!(command.args, vec!["--rate=+0%", "--text", "hello there"]);
        assert_eq!(command.stdin, None);
    }

    #[test]
    fn test_engine_command_espeak_rate_and_voice() {
        let utterance = Voice {
            rate: 2.0,
            pitch: 1.0,
            name: Some("en-us".to_string()),
        }
        .utterance("hi");
        let command = engine_command("espeak", &utterance).unwrap();
        assert_eq!(command.program, "espeak");
        assert_eq!(command.args, vec!["-s", "350", "-p", "50", "-v", "en-us", "hi"]);
    }

    #[test]
    fn test_engine_command_template_keeps_text_whole() {
        let command = engine_command("piper-say --quiet {}", &utterance("two words")).unwrap();
        assert_eq!(command.program, "piper-say");
        assert_eq!(command.args, vec!["--quiet", "two words"]);
    }

    #[test]
    fn test_engine_command_custom_program() {
        let command = engine_command("festival-say", &utterance("x")).unwrap();
        assert_eq!(command.program, "festival-say");
        assert_eq!(command.args, vec!["x"]);
    }

    #[test]
    fn test_long_text_goes_to_stdin() {
        let long = "word ".repeat(MAX_ARG_TEXT / 4);
        let command = engine_command("espeak", &utterance(&long)).unwrap();
        assert_eq!(command.args, vec!["-s", "175", "-p", "50", "--stdin"]);
        assert_eq!(command.stdin.as_deref(), Some(long.as_str()));

        let command = engine_command("", &utterance(&long)).unwrap();
        assert_eq!(command.args, vec!["--rate=+0%", "--file", "/dev/stdin"]);

        let command = engine_command("festival-say", &utterance(&long)).unwrap();
        assert!(command.args.is_empty());
        assert!(command.stdin.is_some());

        assert_eq!(engine_command("piper-say {}", &utterance(&long)), None);
    }

    #[test]
    fn test_silent_speech_is_never_speaking() {
        let mut speech = SilentSpeech;
        assert!(!speech.speak(&utterance("quiet")));
        assert!(!speech.is_speaking());
    }

    #[test]
    fn test_command_speech_missing_program_is_not_speaking() {
        let mut speech = CommandSpeech::new("lectern-no-such-tts-engine");
        assert!(!speech.speak(&utterance("hello")));
        assert!(!speech.is_speaking());
        speech.cancel();
    }
}
