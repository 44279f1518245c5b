//! Music playback placeholder.
//!
//! There is no music synthesis. A "playing" song simply reports itself as
//! playing for thirty seconds of game time, looping or not, so game logic
//! that waits on music keeps moving.

/// Game ticks per second.
pub const TICRATE: i32 = 35;

/// How long a non-looping song claims to play, in seconds.
pub const SONG_SECONDS: i32 = 30;

/// Handle returned for every registered song.
pub const SONG_HANDLE: i32 = 1;

#[derive(Debug, Default)]
pub struct MusicStub {
    dies_at: i32,
    volume: i32,
}

impl MusicStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, _data: &[u8]) -> i32 {
        SONG_HANDLE
    }

    pub fn unregister(&mut self, _handle: i32) {}

    /// The looping flag is accepted and ignored.
    pub fn play(&mut self, _handle: i32, _looping: bool, now: i32) {
        self.dies_at = now.saturating_add(TICRATE * SONG_SECONDS);
    }

    pub fn pause(&mut self, _handle: i32) {}

    pub fn resume(&mut self, _handle: i32) {}

    pub fn stop(&mut self, _handle: i32) {
        self.dies_at = 0;
    }

    pub fn is_playing(&self, _handle: i32, now: i32) -> bool {
        self.dies_at > now
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume;
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_plays_for_thirty_seconds() {
        let mut music = MusicStub::new();
        let song = music.register(b"MUS\x1a");
        assert_eq!(song, 1);
        assert!(!music.is_playing(song, 0));

        music.play(song, false, 100);
        assert!(music.is_playing(song, 100));
        assert!(music.is_playing(song, 100 + 35 * 30 - 1));
        assert!(!music.is_playing(song, 100 + 35 * 30));
    }

    #[test]
    fn looping_song_still_times_out() {
        let mut music = MusicStub::new();
        music.play(1, true, 0);
        assert!(music.is_playing(1, 35 * 30 - 1));
        assert!(!music.is_playing(1, 35 * 30));
    }

    #[test]
    fn stop_ends_song() {
        let mut music = MusicStub::new();
        music.play(1, true, 0);
        music.stop(1);
        assert!(!music.is_playing(1, 1));
    }

    #[test]
    fn pause_and_resume_are_inert() {
        let mut music = MusicStub::new();
        music.play(1, false, 0);
        music.pause(1);
        assert!(music.is_playing(1, 10));
        music.resume(1);
        assert!(music.is_playing(1, 10));
        music.unregister(1);
        assert!(music.is_playing(1, 10));
    }

    #[test]
    fn volume_is_stored() {
        let mut music = MusicStub::new();
        music.set_volume(9);
        assert_eq!(music.volume(), 9);
    }
}
