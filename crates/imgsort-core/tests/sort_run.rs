//! End-to-end runs over generated image trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::RgbImage;
use imgsort_core::config::TransferMode;
use imgsort_core::{CancelSignal, Category, Config, ImageSorter, RunState};

struct Fixture {
    _dir: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let input = root.join("in");
        fs::create_dir_all(&input).unwrap();
        Self {
            _dir: dir,
            input,
            output: root.join("out"),
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = self.input.clone();
        config.paths.destination_dir = self.output.clone();
        config.classification.large_pixel_threshold = 100;
        config.classification.xl_pixel_threshold = 200;
        config.processing.max_workers = 4;
        config.processing.batch_size = 2;
        config
    }

    fn png(&self, rel: &str, width: u32, height: u32) -> PathBuf {
        let path = self.input.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    fn jpeg_with_dpi(&self, rel: &str, width: u32, height: u32, dpi: u16) -> PathBuf {
        let path = self.input.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut encoder = JpegEncoder::new(file);
        encoder.set_pixel_density(PixelDensity::dpi(dpi));
        encoder.encode_image(&RgbImage::new(width, height)).unwrap();
        path
    }

    fn junk(&self, rel: &str) -> PathBuf {
        let path = self.input.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not an image").unwrap();
        path
    }

    fn out(&self, rel: &str) -> PathBuf {
        self.output.join(rel)
    }
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sorts_images_into_category_and_shape_folders() {
    let fx = Fixture::new();
    fx.png("tiny.png", 50, 40);
    fx.png("square.png", 150, 150);
    fx.png("banner.png", 250, 100);
    fx.jpeg_with_dpi("print.jpg", 250, 300, 300);

    let sorter = ImageSorter::new(fx.config()).unwrap();
    let report = sorter.run(CancelSignal::new()).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 4);
    assert!(report.is_clean());
    assert_eq!(report.state, RunState::Completed);

    assert!(fx.out("Small/Landscape/tiny.png").is_file());
    assert!(fx.out("Large/Square/square.png").is_file());
    assert!(fx.out("XLarge/Landscape/banner.png").is_file());
    assert!(fx.out("Best Quality/Portrait/print.jpg").is_file());
    assert_eq!(report.per_category[&Category::BestQuality], 1);

    // Move mode empties the input
    assert!(files_under(&fx.input).is_empty());
}

#[tokio::test]
async fn unreadable_files_are_isolated() {
    let fx = Fixture::new();
    for i in 0..6 {
        fx.png(&format!("good{i}.png"), 60, 80);
    }
    fx.junk("broken.jpg");
    fx.junk("nested/also-broken.png");

    let report = ImageSorter::new(fx.config())
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.total, 8);
    assert_eq!(report.succeeded, 6);
    assert_eq!(report.failed, 2);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].path.ends_with("broken.jpg"));
    assert_eq!(report.per_category[&Category::Error], 2);
    assert_eq!(report.per_category[&Category::Small], 6);

    assert!(fx.out("Errors/broken.jpg").is_file());
    assert!(fx.out("Errors/also-broken.png").is_file());
    assert_eq!(files_under(&fx.out("Small/Portrait")).len(), 6);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn keeps_directory_structure_when_enabled() {
    let fx = Fixture::new();
    fx.png("2021/trip/beach.png", 120, 90);
    fx.junk("2021/trip/notes.png");

    let mut config = fx.config();
    config.layout.keep_directory_structure = true;

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert!(fx.out("Large/Landscape/2021/trip/beach.png").is_file());
    assert!(fx.out("Errors/2021/trip/notes.png").is_file());
}

#[tokio::test]
async fn copy_mode_leaves_sources_in_place() {
    let fx = Fixture::new();
    let source = fx.png("keep.png", 30, 30);

    let mut config = fx.config();
    config.processing.transfer_mode = TransferMode::Copy;
    config.classification.sort_by_shape = false;

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert!(source.is_file());
    let copied = fx.out("Small/keep.png");
    assert_eq!(
        fs::metadata(&copied).unwrap().len(),
        fs::metadata(&source).unwrap().len()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn colliding_names_never_overwrite() {
    let fx = Fixture::new();
    for dir in ["a", "b", "c", "d", "e"] {
        fx.png(&format!("{dir}/photo.png"), 40, 40);
    }
    fs::create_dir_all(fx.out("Small/Square")).unwrap();
    fs::write(fx.out("Small/Square/photo.png"), b"from an earlier run").unwrap();

    let report = ImageSorter::new(fx.config())
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 5);
    assert_eq!(
        fs::read(fx.out("Small/Square/photo.png")).unwrap(),
        b"from an earlier run"
    );
    let mut names: Vec<String> = files_under(&fx.out("Small/Square"))
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "photo (1).png",
            "photo (2).png",
            "photo (3).png",
            "photo (4).png",
            "photo (5).png",
            "photo.png"
        ]
    );
}

#[tokio::test]
async fn quality_gate_respects_min_year() {
    let fx = Fixture::new();
    fx.jpeg_with_dpi("recent.jpg", 300, 300, 300);
    fx.jpeg_with_dpi("low-dpi.jpg", 300, 200, 72);

    let mut config = fx.config();
    config.classification.min_year = 3000;

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert!(fx.out("XLarge/Square/recent.jpg").is_file());
    assert!(fx.out("XLarge/Landscape/low-dpi.jpg").is_file());
    assert!(!report.per_category.contains_key(&Category::BestQuality));
}

#[tokio::test]
async fn cancelled_run_touches_nothing() {
    let fx = Fixture::new();
    let sources: Vec<_> = (0..5)
        .map(|i| fx.png(&format!("img{i}.png"), 20, 20))
        .collect();

    let cancel = CancelSignal::new();
    cancel.cancel();
    let report = ImageSorter::new(fx.config())
        .unwrap()
        .run(cancel)
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert_eq!(report.not_processed, 5);
    assert!(sources.iter().all(|p| p.is_file()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_mid_run_finishes_in_flight_files() {
    let fx = Fixture::new();
    for i in 0..40 {
        fx.png(&format!("img{i:02}.png"), 20, 20);
    }

    let mut config = fx.config();
    config.processing.max_workers = 2;
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    let report = ImageSorter::new(config)
        .unwrap()
        .run_with_progress(cancel, move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                trigger.cancel();
            }
        })
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert!(report.processed() < 40);
    assert_eq!(report.processed() + report.not_processed, 40);
    assert_eq!(report.processed(), seen.load(Ordering::SeqCst));

    // Every file is in exactly one place, whole
    let moved = files_under(&fx.output);
    let left = files_under(&fx.input);
    assert_eq!(moved.len(), report.succeeded);
    assert_eq!(moved.len() + left.len(), 40);
    for path in moved {
        assert!(image::image_dimensions(&path).is_ok());
    }
}

#[tokio::test]
async fn destination_inside_input_is_not_resorted() {
    let fx = Fixture::new();
    fx.png("fresh.png", 20, 20);

    let mut config = fx.config();
    config.paths.destination_dir = fx.input.join("Sorted");
    fs::create_dir_all(fx.input.join("Sorted/Small/Square")).unwrap();
    RgbImage::new(20, 20)
        .save(fx.input.join("Sorted/Small/Square/old.png"))
        .unwrap();

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert!(fx.input.join("Sorted/Small/Square/fresh.png").is_file());
    assert!(fx.input.join("Sorted/Small/Square/old.png").is_file());
}

#[tokio::test]
async fn both_dimensions_rule_produces_standard_tier() {
    let fx = Fixture::new();
    fx.png("wide.png", 150, 60);

    let mut config = fx.config();
    config.classification.size_rule = imgsort_core::config::SizeRule::BothDimensions;

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert!(fx.out("Standard/Landscape/wide.png").is_file());
}

#[tokio::test]
async fn input_nested_inside_destination_is_sorted() {
    let fx = Fixture::new();
    fx.png("a.png", 20, 20);
    fx.png("later/b.png", 20, 20);
    let library = fx.input.parent().unwrap().to_path_buf();

    let mut config = fx.config();
    config.paths.destination_dir = library.clone();

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);
    assert!(library.join("Small/Square/a.png").is_file());
    assert!(library.join("Small/Square/b.png").is_file());
    assert!(files_under(&fx.input).is_empty());
}

#[tokio::test]
async fn blocked_category_folder_falls_back_to_errors() {
    let fx = Fixture::new();
    let source = fx.png("x.png", 20, 20);
    fs::create_dir_all(&fx.output).unwrap();
    fs::write(fx.out("Small"), b"a file where a folder should be").unwrap();

    let mut config = fx.config();
    config.classification.sort_by_shape = false;

    let report = ImageSorter::new(config)
        .unwrap()
        .run(CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.per_category[&Category::Error], 1);
    assert!(report.errors[0].path.ends_with("x.png"));
    assert!(fx.out("Errors/x.png").is_file());
    assert!(!source.exists());
    assert_eq!(
        fs::read(fx.out("Small")).unwrap(),
        b"a file where a folder should be"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn colliding_names_are_suffixed_in_input_order() {
    // Same run twice over identical trees with different worker counts
    for workers in [1, 4] {
        let fx = Fixture::new();
        for (i, dir) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let side = 40 + i as u32;
            fx.png(&format!("{dir}/photo.png"), side, side);
        }

        let mut config = fx.config();
        config.processing.max_workers = workers;
        config.processing.batch_size = 5;

        let report = ImageSorter::new(config)
            .unwrap()
            .run(CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(report.succeeded, 5);

        for (name, side) in [
            ("photo.png", 40),
            ("photo (1).png", 41),
            ("photo (2).png", 42),
            ("photo (3).png", 43),
            ("photo (4).png", 44),
        ] {
            let path = fx.out(&format!("Small/Square/{name}"));
            assert_eq!(
                image::image_dimensions(&path).unwrap(),
                (side, side),
                "{name} with {workers} worker(s)"
            );
        }
    }
}
