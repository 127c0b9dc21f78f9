//! Media transport seam

/// One-way command for the media transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    SeekTo(f64),
    Play,
    Pause,
    SetPlaybackRate(f64),
}

/// Read-only transport state sampled on every time update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportSnapshot {
    /// Playhead in seconds
    pub current_time: f64,
    /// Track length in seconds (0 while unknown)
    pub duration: f64,
    pub playback_rate: f64,
    pub is_playing: bool,
}

impl TransportSnapshot {
    pub fn at(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
            playback_rate: 1.0,
            is_playing: true,
        }
    }
}

/// The external media player (decode, render and seek live elsewhere)
pub trait MediaTransport {
    fn current_time(&self) -> f64;
    /// Track length in seconds, 0 while unknown
    fn duration(&self) -> f64;
    fn playback_rate(&self) -> f64;
    fn is_playing(&self) -> bool;

    fn seek_to(&mut self, time: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn play(&mut self);
    fn pause(&mut self);

    fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            current_time: self.current_time(),
            duration: self.duration(),
            playback_rate: self.playback_rate(),
            is_playing: self.is_playing(),
        }
    }
}

/// Apply commands to a transport in order
pub fn apply_commands<T: MediaTransport + ?Sized>(transport: &mut T, commands: &[PlaybackCommand]) {
    for command in commands {
        match *command {
            PlaybackCommand::SeekTo(time) => transport.seek_to(time),
            PlaybackCommand::Play => transport.play(),
            PlaybackCommand::Pause => transport.pause(),
            PlaybackCommand::SetPlaybackRate(rate) => transport.set_playback_rate(rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeTransport {
        time: f64,
        rate: f64,
        playing: bool,
    }

    impl MediaTransport for FakeTransport {
        fn current_time(&self) -> f64 {
            self.time
        }
        fn duration(&self) -> f64 {
            60.0
        }
        fn playback_rate(&self) -> f64 {
            self.rate
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn seek_to(&mut self, time: f64) {
            self.time = time;
        }
        fn set_playback_rate(&mut self, rate: f64) {
            self.rate = rate;
        }
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
    }

    #[test]
    fn test_apply_commands_in_order() {
        let mut transport = FakeTransport::default();
        apply_commands(
            &mut transport,
            &[
                PlaybackCommand::SeekTo(12.0),
                PlaybackCommand::SetPlaybackRate(0.75),
                PlaybackCommand::Play,
            ],
        );
        let snap = transport.snapshot();
        assert_eq!(snap.current_time, 12.0);
        assert_eq!(snap.playback_rate, 0.75);
        assert!(snap.is_playing);
        assert_eq!(snap.duration, 60.0);
    }
}
