mod common;

use std::{path::Path, sync::Arc};

use common::Harness;
use timer_bell::{
    error::AppError,
    services::JsonFileStore,
    state::{SoundSpec, TimerStatus},
};

#[test]
fn create_starts_running_with_full_time() {
    let h = Harness::new();
    let timer = h.state.create_timer("Pasta", 480, SoundSpec::Default).unwrap();
    assert_eq!(timer.status, TimerStatus::Running);
    assert_eq!(timer.remaining_seconds, 480);
    assert_eq!(timer.remaining, "00:08:00");
}

#[test]
fn invalid_input_is_rejected() {
    let h = Harness::new();
    assert!(matches!(
        h.state.create_timer("", 10, SoundSpec::Default),
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        h.state.create_timer("Tea", 0, SoundSpec::Default),
        Err(AppError::InvalidInput(_))
    ));
    assert!(h.state.list_timers().unwrap().is_empty());
}

#[test]
fn cake_rings_exactly_once() {
    let h = Harness::new();
    let timer = h.state.create_timer("Cake", 5, SoundSpec::Default).unwrap();

    assert_eq!(h.ticks(4), 0);
    assert_eq!(h.tick(), 1);
    assert_eq!(h.state.get_timer(timer.id).unwrap().status, TimerStatus::Finished);

    let sent = h.notifier.sent();
    assert_eq!(sent, vec![("Timer done".to_string(), "Cake finished.".to_string())]);
    let played = h.audio.played();
    assert_eq!(played.len(), 1);
    assert!(played[0].bytes.as_ref().unwrap().starts_with(b"RIFF"));

    assert_eq!(h.ticks(10), 0);
    assert_eq!(h.notifier.sent().len(), 1);
    assert_eq!(h.audio.played().len(), 1);
    // Removed after the grace period
    assert!(matches!(h.state.get_timer(timer.id), Err(AppError::TimerNotFound(_))));
}

#[test]
fn laundry_pause_does_not_consume_time() {
    let h = Harness::new();
    let timer = h.state.create_timer("Laundry", 10, SoundSpec::Default).unwrap();

    h.ticks(3);
    let paused = h.state.pause_timer(timer.id).unwrap();
    assert_eq!(paused.status, TimerStatus::Paused);
    assert_eq!(paused.remaining_seconds, 7);

    assert_eq!(h.ticks(100), 0);
    assert_eq!(h.state.get_timer(timer.id).unwrap().remaining_seconds, 7);

    h.state.resume_timer(timer.id).unwrap();
    assert_eq!(h.ticks(6), 0);
    assert_eq!(h.tick(), 1);
    assert_eq!(h.state.get_timer(timer.id).unwrap().status, TimerStatus::Finished);
}

#[test]
fn toggle_matches_pause_button() {
    let h = Harness::new();
    let timer = h.state.create_timer("Tea", 10, SoundSpec::Default).unwrap();
    assert_eq!(h.state.toggle_timer(timer.id).unwrap().status, TimerStatus::Paused);
    assert_eq!(h.state.toggle_timer(timer.id).unwrap().status, TimerStatus::Running);
}

#[test]
fn stop_is_idempotent_and_never_rings() {
    let h = Harness::new();
    let timer = h.state.create_timer("Tea", 3, SoundSpec::Default).unwrap();
    h.tick();

    assert_eq!(h.state.stop_timer(timer.id).unwrap().status, TimerStatus::Stopped);
    assert_eq!(h.state.stop_timer(timer.id).unwrap().status, TimerStatus::Stopped);
    assert_eq!(h.state.resume_timer(timer.id).unwrap().status, TimerStatus::Stopped);

    assert_eq!(h.ticks(5), 0);
    assert!(h.notifier.sent().is_empty());
    assert!(h.audio.played().is_empty());
    assert!(h.state.list_timers().unwrap().is_empty());
}

#[test]
fn stopping_a_finished_timer_silences_its_alarm() {
    let h = Harness::new();
    let timer = h.state.create_timer("Tea", 1, SoundSpec::Default).unwrap();
    h.tick();
    assert_eq!(h.state.active_alarm().unwrap().timer_id, Some(timer.id));

    let view = h.state.stop_timer(timer.id).unwrap();
    assert_eq!(view.status, TimerStatus::Finished);
    assert!(h.state.active_alarm().is_none());
    assert!(h.audio.played()[0].is_halted());
}

#[test]
fn new_alarm_replaces_previous_one() {
    let h = Harness::new();
    let first = h.state.create_timer("First", 1, SoundSpec::Default).unwrap();
    let second = h.state.create_timer("Second", 2, SoundSpec::Default).unwrap();

    h.tick();
    assert_eq!(h.state.active_alarm().unwrap().timer_id, Some(first.id));
    h.tick();
    assert_eq!(h.state.active_alarm().unwrap().timer_id, Some(second.id));

    let played = h.audio.played();
    assert_eq!(played.len(), 2);
    assert!(played[0].is_halted());
    assert!(!played[1].is_halted());
    // The first chime's transient file is gone
    assert!(!Path::new(&played[0].target).exists());
}

#[test]
fn uploaded_sound_plays_from_transient_file() {
    let h = Harness::new();
    let blob = h
        .state
        .upload_sound("ding.mp3", "audio/mpeg", b"ID3-ding".to_vec())
        .unwrap();
    let timer = h
        .state
        .create_timer(
            "Tea",
            1,
            SoundSpec::Uploaded { name: String::new(), blob: blob.blob },
        )
        .unwrap();
    assert_eq!(
        timer.sound,
        SoundSpec::Uploaded { name: "ding.mp3".into(), blob: blob.blob }
    );

    h.tick();
    let played = h.audio.played();
    assert_eq!(played[0].bytes.as_deref(), Some(&b"ID3-ding"[..]));
    assert!(played[0].target.ends_with(".mp3"));

    assert!(h.state.silence_alarm().unwrap());
    assert!(!Path::new(&played[0].target).exists());
    assert!(!h.state.silence_alarm().unwrap());
}

#[test]
fn uploaded_sound_is_released_once_its_timers_are_gone() {
    let h = Harness::new();
    let used = h.state.upload_sound("ding", "audio/wav", b"RIFF-ding".to_vec()).unwrap();
    let spare = h.state.upload_sound("spare.wav", "audio/wav", b"RIFF".to_vec()).unwrap();
    let sound = |blob| SoundSpec::Uploaded { name: String::new(), blob };

    h.state.create_timer("Short", 1, sound(used.blob)).unwrap();
    h.state.create_timer("Long", 3, sound(used.blob)).unwrap();

    h.tick();
    let played = h.audio.played();
    assert!(played[0].target.ends_with(".wav"));
    assert_eq!(played[0].bytes.as_deref(), Some(&b"RIFF-ding"[..]));

    // "Short" is swept but "Long" still needs the sound
    h.tick();
    assert!(h.state.create_timer("Again", 5, sound(used.blob)).is_ok());

    h.ticks(6);
    assert!(h.state.list_timers().unwrap().is_empty());
    assert!(matches!(
        h.state.create_timer("Again", 5, sound(used.blob)),
        Err(AppError::BlobNotFound(_))
    ));

    // Never used by a timer, so still available
    assert!(h.state.create_timer("Spare", 5, sound(spare.blob)).is_ok());
}

#[test]
fn removed_sound_falls_back_to_chime() {
    let h = Harness::new();
    let blob = h.state.upload_sound("ding.wav", "audio/wav", b"RIFF-ding".to_vec()).unwrap();
    h.state
        .create_timer("Tea", 1, SoundSpec::Uploaded { name: String::new(), blob: blob.blob })
        .unwrap();

    h.state.remove_sound(blob.blob).unwrap();
    assert!(matches!(h.state.remove_sound(blob.blob), Err(AppError::BlobNotFound(_))));

    h.tick();
    let played = h.audio.played();
    assert_eq!(played.len(), 1);
    assert!(played[0].bytes.as_deref().unwrap().starts_with(b"RIFF"));
    assert_ne!(played[0].bytes.as_deref(), Some(&b"RIFF-ding"[..]));
}

#[test]
fn preview_takes_the_alarm_slot() {
    let h = Harness::new();
    let timer = h.state.create_timer("Tea", 1, SoundSpec::Default).unwrap();
    h.tick();
    assert_eq!(h.state.active_alarm().unwrap().timer_id, Some(timer.id));

    let url = "https://cdn.test/rooster-hq.mp3";
    let preview = h.state.preview_sound("Rooster", url).unwrap();
    assert_eq!(preview.timer_id, None);

    let played = h.audio.played();
    assert_eq!(played.len(), 2);
    assert!(played[0].is_halted());
    assert_eq!(played[1].target, url);
    assert_eq!(h.state.active_alarm().unwrap().sound, "Rooster");

    // Stopping the finished timer leaves someone else's preview alone
    h.state.stop_timer(timer.id).unwrap();
    assert!(!played[1].is_halted());

    assert!(h.state.silence_alarm().unwrap());
    assert!(played[1].is_halted());
    assert!(h.state.active_alarm().is_none());

    assert!(matches!(
        h.state.preview_sound("Bad", "ftp://cdn.test/x.mp3"),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn unknown_upload_is_rejected() {
    let h = Harness::new();
    let err = h
        .state
        .create_timer("Tea", 5, SoundSpec::Uploaded { name: "x".into(), blob: 42 })
        .unwrap_err();
    assert!(matches!(err, AppError::BlobNotFound(42)));
}

#[test]
fn remote_preview_is_streamed_by_url() {
    let h = Harness::new();
    let url = "https://cdn.test/bell-hq.mp3";
    h.state
        .create_timer(
            "Tea",
            1,
            SoundSpec::RemotePreview { name: "Bell".into(), url: url.into() },
        )
        .unwrap();
    h.tick();
    assert_eq!(h.audio.played()[0].target, url);
    assert_eq!(h.state.active_alarm().unwrap().sound, "Bell");

    assert!(matches!(
        h.state.create_timer(
            "Tea",
            1,
            SoundSpec::RemotePreview { name: "Bad".into(), url: "file:///etc/passwd".into() },
        ),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn saved_default_sound_replaces_builtin_chime() {
    let h = Harness::new();
    h.state
        .set_default_sound("bell.wav", "audio/wav", b"RIFF-bell")
        .unwrap();

    let timer = h.state.create_timer("Tea", 1, SoundSpec::Default).unwrap();
    assert_eq!(timer.sound, SoundSpec::SavedDefault { name: "bell.wav".into() });

    h.tick();
    assert_eq!(h.audio.played()[0].bytes.as_deref(), Some(&b"RIFF-bell"[..]));
}

#[test]
fn denied_permission_still_plays_sound() {
    let h = Harness::new();
    h.state.set_notification_permission(false);
    h.state.create_timer("Tea", 1, SoundSpec::Default).unwrap();
    h.tick();
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.audio.played().len(), 1);
    assert!(matches!(h.state.test_notification(), Err(AppError::PermissionDenied)));
}

#[test]
fn custom_notification_message() {
    let h = Harness::new();
    h.state.set_notification_message("{app} is done!").unwrap();
    h.state.create_timer("Cake", 1, SoundSpec::Default).unwrap();
    h.tick();
    assert_eq!(h.notifier.sent()[0].1, "Cake is done!");
}

#[test]
fn preset_round_trip() {
    let h = Harness::new();
    let sound = SoundSpec::RemotePreview {
        name: "Bell".into(),
        url: "https://cdn.test/bell.mp3".into(),
    };
    let timer = h.state.create_timer("Tea", 240, sound.clone()).unwrap();
    let preset = h.state.save_preset(timer.id).unwrap();
    assert_eq!(preset.total_seconds, 240);
    assert_eq!(preset.sound, sound);

    let reloaded = h.state.start_preset(preset.id).unwrap();
    assert_ne!(reloaded.id, timer.id);
    assert_eq!(reloaded.total_seconds, preset.total_seconds);
    assert_eq!(reloaded.sound, preset.sound);
    assert_eq!(reloaded.status, TimerStatus::Running);

    // Loading does not change the stored preset
    assert_eq!(h.state.list_presets().unwrap(), vec![preset]);
}

#[test]
fn presets_persist_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let preset = {
        let h = Harness::with_store(Arc::new(JsonFileStore::open(&path).unwrap()));
        let timer = h.state.create_timer("Eggs", 420, SoundSpec::Default).unwrap();
        h.state.save_preset(timer.id).unwrap()
    };

    let h = Harness::with_store(Arc::new(JsonFileStore::open(&path).unwrap()));
    assert_eq!(h.state.list_presets().unwrap(), vec![preset.clone()]);

    h.state.delete_preset(preset.id).unwrap();
    assert!(matches!(
        h.state.delete_preset(preset.id),
        Err(AppError::PresetNotFound(_))
    ));
    assert_eq!(h.state.clear_presets().unwrap(), 0);
}

#[test]
fn many_timers_run_independently() {
    let h = Harness::new();
    let ids: Vec<_> = (1..=5)
        .map(|n| h.state.create_timer(&format!("T{}", n), n, SoundSpec::Default).unwrap().id)
        .collect();
    h.state.pause_timer(ids[2]).unwrap();

    assert_eq!(h.ticks(5), 4);
    assert_eq!(h.notifier.sent().len(), 4);
    assert_eq!(h.state.get_timer(ids[2]).unwrap().status, TimerStatus::Paused);
    assert_eq!(h.state.running_timers().unwrap(), 0);
}
