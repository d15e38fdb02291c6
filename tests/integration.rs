use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage};
use pretty_assertions::assert_eq;
use sift::{
    app::{App, AppServices},
    config::{Config, ProcessingConfig},
    image::{resize, ImageProcessor, ImageService, Orientation},
    media::{mime, MediaService, MockMediaClient},
    models::{RunState, UploadOutcome},
    run_log::{LogLevel, RunLog},
};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// JPEG whose APP1 segment carries only an orientation tag.
fn jpeg_with_orientation(width: u32, height: u32, code: u16) -> Vec<u8> {
    let jpeg = encode(width, height, ImageFormat::Jpeg);

    let mut app1 = b"Exif\0\0II".to_vec();
    app1.extend_from_slice(&42u16.to_le_bytes());
    app1.extend_from_slice(&8u32.to_le_bytes());
    app1.extend_from_slice(&1u16.to_le_bytes());
    app1.extend_from_slice(&0x0112u16.to_le_bytes());
    app1.extend_from_slice(&3u16.to_le_bytes());
    app1.extend_from_slice(&1u32.to_le_bytes());
    app1.extend_from_slice(&code.to_le_bytes());
    app1.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

fn app_with_mock(out_dir: &Path, max_width: u32, media: &MockMediaClient, log: Arc<RunLog>) -> App {
    App::with_services(
        AppServices {
            image: Box::new(ImageProcessor::new()),
            media: Some(Box::new(media.clone())),
        },
        ProcessingConfig {
            max_width,
            out_dir: out_dir.to_path_buf(),
            rotate: true,
        },
        0,
        log,
    )
}

#[tokio::test]
async fn test_rotated_photo_is_resized_and_uploaded() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let photo = write(input.path(), "photo.jpg", &jpeg_with_orientation(800, 600, 6));

    let media = MockMediaClient::new().with_base_url("https://blog.test/uploads".to_string());
    let log = Arc::new(RunLog::in_memory(LogLevel::Debug));
    let app = app_with_mock(out.path(), 200, &media, log.clone());

    let report = app.run(&[photo], run_date()).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.output_dir, out.path().join("2026").join("10"));
    assert_eq!(report.processed.len(), 1);

    let processed = &report.processed[0];
    assert_eq!(processed.orientation, Some(Orientation::Rotated90));
    assert_eq!((processed.rotated_width, processed.rotated_height), (600, 800));
    // 200 / 600 * 800 = 266.67, truncated
    assert_eq!((processed.width, processed.height), (200, 266));

    let destination = out.path().join("2026/10/photo.jpg");
    assert_eq!(processed.destination, destination);
    let written = image::open(&destination).unwrap();
    assert_eq!((written.width(), written.height()), (200, 266));

    let uploads = media.get_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].name, "photo.jpg");
    assert_eq!(uploads[0].mime_type, "image/jpeg");
    assert_eq!(uploads[0].bits, fs::read(&destination).unwrap());

    match &report.uploads[0].outcome {
        UploadOutcome::Uploaded(result) => {
            assert_eq!(result.url, "https://blog.test/uploads/photo.jpg");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let messages = log.messages();
    assert!(messages.contains(&"Image dimensions before rotation: (800x600)".to_string()));
    assert!(messages.contains(&"Image dimensions after rotation: (600x800)".to_string()));
}

#[tokio::test]
async fn test_mixed_batch_isolates_failures_and_skips() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let files = vec![
        write(input.path(), "first.png", &encode(120, 60, ImageFormat::Png)),
        write(input.path(), "corrupt.jpg", b"\xFF\xD8\xFF\xE0 truncated"),
        write(input.path(), "diagram.bmp", &encode(30, 30, ImageFormat::Bmp)),
        write(input.path(), "LOUD.GIF", &encode(40, 20, ImageFormat::Gif)),
    ];

    let media = MockMediaClient::new();
    let log = Arc::new(RunLog::in_memory(LogLevel::Info));
    let app = app_with_mock(out.path(), 60, &media, log);

    let report = app.run(&files, run_date()).await.unwrap();

    assert_eq!(report.processed.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, files[1]);

    let outcomes: Vec<&str> = report
        .uploads
        .iter()
        .map(|r| match r.outcome {
            UploadOutcome::Uploaded(_) => "uploaded",
            UploadOutcome::Skipped { .. } => "skipped",
            UploadOutcome::Failed { .. } => "failed",
        })
        .collect();
    assert_eq!(outcomes, vec!["uploaded", "skipped", "uploaded"]);

    let types: Vec<String> = media.get_uploads().into_iter().map(|u| u.mime_type).collect();
    assert_eq!(types, vec!["image/png", "image/gif"]);

    let first = image::open(out.path().join("2026/10/first.png")).unwrap();
    assert_eq!((first.width(), first.height()), (60, 30));
}

#[tokio::test]
async fn test_missing_credentials_processes_without_uploading() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let files = vec![
        write(input.path(), "a.png", &encode(50, 50, ImageFormat::Png)),
        write(input.path(), "b.jpg", &jpeg_with_orientation(50, 25, 3)),
    ];

    let mut config = Config::parse("[image]\nrotate = true\n").unwrap();
    config.image.out_dir = out.path().to_path_buf();

    let log = Arc::new(RunLog::in_memory(LogLevel::Info));
    let app = App::new(&config, false, log.clone()).unwrap();
    let report = app.run(&files, run_date()).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.processed.len(), 2);
    assert!(report.failures.is_empty());
    assert!(report.uploads.is_empty());
    assert!(out.path().join("2026/10/a.png").exists());
    assert!(out.path().join("2026/10/b.jpg").exists());
    assert!(log.messages().contains(&"Not uploading images.".to_string()));
}

#[tokio::test]
async fn test_rerun_on_same_day_overwrites_outputs() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let path = write(input.path(), "a.png", &encode(80, 40, ImageFormat::Png));

    let media = MockMediaClient::new();
    for max_width in [40, 20] {
        let log = Arc::new(RunLog::in_memory(LogLevel::Info));
        let app = app_with_mock(out.path(), max_width, &media, log);
        app.run(std::slice::from_ref(&path), run_date()).await.unwrap();
    }

    let written = image::open(out.path().join("2026/10/a.png")).unwrap();
    assert_eq!((written.width(), written.height()), (20, 10));
    assert_eq!(media.get_call_count(), 2);
}

#[tokio::test]
async fn test_run_log_file_has_one_line_per_event() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let log_path = out.path().join("sift.log");
    let files = vec![write(input.path(), "a.png", &encode(10, 10, ImageFormat::Png))];

    let media = MockMediaClient::new();
    let log = Arc::new(RunLog::create(&log_path, LogLevel::Info).unwrap());
    let app = app_with_mock(out.path(), 0, &media, log.clone());
    app.run(&files, run_date()).await.unwrap();
    log.flush().unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), log.entries().len());
    assert!(content.lines().any(|l| l.ends_with("Uploading a.png (image/png)")));
}

#[tokio::test]
async fn test_public_building_blocks() {
    // max_width = 0 is a no-op; narrower images are untouched.
    assert_eq!(resize::plan(4000, 3000, 0), (4000, 3000));
    assert_eq!(resize::plan(900, 300, 1000), (900, 300));
    assert_eq!(resize::plan(3000, 4000, 1000), (1000, 1333));

    assert_eq!(mime::classify(Path::new("x.JPEG")), Some("image/jpeg"));
    assert_eq!(mime::classify(Path::new("x.bmp")), None);

    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let path = write(input.path(), "plain.png", &encode(12, 6, ImageFormat::Png));
    let processed = ImageProcessor::new()
        .process_image(&path, &ProcessingConfig::default(), out.path())
        .await
        .unwrap();
    assert_eq!((processed.width, processed.height), (12, 6));

    let media = MockMediaClient::new();
    let request = sift::media::build_request(&processed.destination, "image/png")
        .await
        .unwrap();
    let result = media.upload_file(&request).await.unwrap();
    assert_eq!(result.mime_type, "image/png");
}
