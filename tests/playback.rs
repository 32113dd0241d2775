use lectern::playback::{FlashScheduler, PlayState, ScrollScheduler, Speech, Utterance, Voice};
use lectern::tokenizer::TokenStream;
use std::time::{Duration, Instant};

/// Speech double that remembers what it was asked to say.
#[derive(Default)]
struct Transcript {
    spoken: Vec<String>,
    speaking: bool,
}

impl Speech for Transcript {
    fn speak(&mut self, utterance: &Utterance) -> bool {
        self.spoken.push(utterance.text.clone());
        self.speaking = true;
        true
    }

    fn cancel(&mut self) {
        self.speaking = false;
    }

    fn is_speaking(&mut self) -> bool {
        self.speaking
    }
}

fn words(count: usize) -> TokenStream {
    TokenStream::from((0..count).map(|i| format!("w{i}")).collect::<Vec<_>>())
}

#[test]
fn test_five_ticks_at_300_wpm() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(20), Transcript::default()).with_wpm(300);
    assert_eq!(flash.period(), Duration::from_millis(200));

    flash.start(t0);
    for tick in 1..=5 {
        flash.poll(t0 + Duration::from_millis(200 * tick));
    }
    assert_eq!(flash.index(), 5);
    assert_eq!(flash.state(), PlayState::Playing);
}

#[test]
fn test_late_poll_catches_up_without_drift() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(20), Transcript::default()).with_wpm(600);
    flash.start(t0);
    assert!(flash.poll(t0 + Duration::from_millis(450)));
    assert_eq!(flash.index(), 4);
    assert_eq!(flash.next_deadline(), Some(t0 + Duration::from_millis(500)));
}

#[test]
fn test_groups_advance_and_stop_at_last_word() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(7), Transcript::default())
        .with_wpm(300)
        .with_group_size(3);
    flash.start(t0);
    assert_eq!(flash.current_words(), "w0 w1 w2");
    flash.poll(t0 + Duration::from_millis(600));
    assert_eq!(flash.current_words(), "w3 w4 w5");
    flash.poll(t0 + Duration::from_secs(10));
    assert_eq!(flash.index(), 6);
    assert_eq!(flash.state(), PlayState::Stopped);
    assert_eq!(flash.next_deadline(), None);

    flash.toggle(t0 + Duration::from_secs(11));
    assert_eq!(flash.index(), 0);
    assert!(flash.is_playing());
}

#[test]
fn test_repeated_start_keeps_one_timer() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(20), Transcript::default()).with_wpm(300);
    flash.start(t0);
    flash.start(t0 + Duration::from_millis(150));
    flash.poll(t0 + Duration::from_millis(200));
    assert_eq!(flash.index(), 1);
}

#[test]
fn test_speed_change_rearms_period() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(20), Transcript::default()).with_wpm(300);
    flash.start(t0);
    flash.faster(t0 + Duration::from_millis(100));
    assert_eq!(flash.wpm(), 325);
    let expected = t0 + Duration::from_millis(100) + flash.period();
    assert_eq!(flash.next_deadline(), Some(expected));

    flash.set_wpm(5_000, t0);
    assert_eq!(flash.wpm(), 1_000);
}

#[test]
fn test_voice_speaks_each_group() {
    let t0 = Instant::now();
    let mut flash = FlashScheduler::new(words(4), Transcript::default())
        .with_wpm(300)
        .with_group_size(2)
        .with_voice(Some(Voice::default()));
    flash.start(t0);
    flash.poll(t0 + Duration::from_millis(400));
    assert_eq!(flash.speech().spoken, vec!["w0 w1", "w2 w3"]);

    flash.stop();
    assert!(!flash.speech().speaking);
}

#[test]
fn test_seek_and_skip_clamp() {
    let mut flash = FlashScheduler::new(words(40), Transcript::default());
    flash.seek(0.5);
    assert_eq!(flash.index(), 20);
    flash.skip_forward();
    assert_eq!(flash.index(), 30);
    flash.seek(7.0);
    assert_eq!(flash.index(), 39);
    flash.skip_back();
    flash.skip_back();
    flash.skip_back();
    flash.skip_back();
    assert_eq!(flash.index(), 0);
    assert!(!flash.is_playing());
}

#[test]
fn test_scroll_speaks_whole_text_once() {
    let t0 = Instant::now();
    let mut scroll = ScrollScheduler::new("all of the words", Transcript::default())
        .with_speed(100.0)
        .with_voice(Some(Voice::default()));
    scroll.set_extent(5_000.0, 1_000.0);
    scroll.start();
    scroll.frame(t0);
    scroll.frame(t0 + Duration::from_secs(2));
    assert_eq!(scroll.position(), 200.0);
    assert_eq!(scroll.speech().spoken, vec!["all of the words"]);

    scroll.stop();
    scroll.start();
    assert_eq!(scroll.speech().spoken.len(), 2);
}
