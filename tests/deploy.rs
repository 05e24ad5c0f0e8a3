use async_trait::async_trait;
use cellrun::{
    errors::{ImageError, RunError},
    fetch::Fetcher,
    run::run,
    Config, ImageReference, RunOptions,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tokio::runtime::Runtime;
use zip::write::FileOptions;

const DESCRIPTOR: &str = "kind: Cell\nname: app\nreplicas: 1\n";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_home(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "cellrun-deploy-test-{}-{}-{}",
        tag,
        std::process::id(),
        rand::random::<u64>()
    ))
}

fn write_bundle_to(archive_path: &Path, name: &str, source: &str, descriptor: &str) {
    fs::create_dir_all(archive_path.parent().unwrap()).unwrap();
    let file = fs::File::create(archive_path).unwrap();
    let mut bundle = zip::ZipWriter::new(file);
    let options = FileOptions::default();
    bundle.add_directory("src/", options).unwrap();
    bundle
        .start_file(format!("src/{}.bal", name), options)
        .unwrap();
    bundle.write_all(source.as_bytes()).unwrap();
    bundle.add_directory("artifacts/", options).unwrap();
    bundle.add_directory("artifacts/cells/", options).unwrap();
    bundle
        .start_file(format!("artifacts/cells/{}.yaml", name), options)
        .unwrap();
    bundle.write_all(descriptor.as_bytes()).unwrap();
    bundle.finish().unwrap();
}

fn write_bundle(config: &Config, image: &ImageReference, source: &str, descriptor: &str) {
    write_bundle_to(&config.archive_path(image), image.name(), source, descriptor);
}

/// Stands in for the registry; deployments with a local archive never fetch
struct NoFetch;

#[async_trait]
impl Fetcher for NoFetch {
    async fn fetch(&self, image: &ImageReference, _dest: &Path) -> Result<(), ImageError> {
        Err(ImageError::NotFound(image.as_str().to_owned()))
    }
}

/// Publishes a fixed bundle on demand
struct BundleFetcher {
    source: String,
    descriptor: String,
}

#[async_trait]
impl Fetcher for BundleFetcher {
    async fn fetch(&self, image: &ImageReference, dest: &Path) -> Result<(), ImageError> {
        write_bundle_to(dest, image.name(), &self.source, &self.descriptor);
        Ok(())
    }
}

#[test]
fn deploys_bundle_without_entry_point() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("plain");
        let config = Config::with_home(home.clone())
            .with_runtime_program("false")
            .with_orchestrator_program("true");
        let image: ImageReference = "org/app:1.0.0".parse().unwrap();
        write_bundle(&config, &image, "public function build() {\n}\n", DESCRIPTOR);

        run(&config, &NoFetch, &image, &RunOptions::default())
            .await
            .unwrap();

        // Staging is released on success; the local archive stays cached
        assert!(!config.staging_dir(&image).exists());
        assert!(config.archive_path(&image).is_file());
        fs::remove_dir_all(&home).unwrap();
    })
}

#[test]
fn pulls_a_missing_image_before_deploying() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("pull");
        let config = Config::with_home(home.clone()).with_orchestrator_program("true");
        let image: ImageReference = "org/app:2.0.0".parse().unwrap();
        let fetcher = BundleFetcher {
            source: "public function build() {\n}\n".to_owned(),
            descriptor: DESCRIPTOR.to_owned(),
        };

        assert!(!config.archive_path(&image).exists());
        run(&config, &fetcher, &image, &RunOptions::default())
            .await
            .unwrap();

        assert!(config.archive_path(&image).is_file());
        assert!(!config.staging_dir(&image).exists());
        fs::remove_dir_all(&home).unwrap();
    })
}

#[test]
fn offline_mode_refuses_to_fetch() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("offline");
        let config = Config::with_home(home.clone()).offline();
        let image: ImageReference = "org/app:3.0.0".parse().unwrap();

        match run(&config, &NoFetch, &image, &RunOptions::default()).await {
            Err(RunError::ImageError(ImageError::NotFound(tag))) => {
                assert_eq!(tag, "org/app:3.0.0")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    })
}

#[test]
fn failed_submission_keeps_staging_when_asked() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("keep");
        let config = Config::with_home(home.clone())
            .keep_failed()
            .with_runtime_program("true")
            .with_orchestrator_program("false");
        let image: ImageReference = "org/app:1.0.0".parse().unwrap();
        write_bundle(
            &config,
            &image,
            "public function run(string org) {\n}\n",
            DESCRIPTOR,
        );

        let options = RunOptions {
            instance_name: Some("myinst".to_owned()),
            dependencies: vec!["db:pg".to_owned(), "cache:redis".to_owned()],
        };
        match run(&config, &NoFetch, &image, &options).await {
            Err(RunError::CommandFailed { program, .. }) => assert_eq!(program, "false"),
            other => panic!("unexpected result: {:?}", other),
        }

        // keep_failed left the staging dir behind, with the rewrite applied
        let descriptor_file =
            Config::bundle_descriptor_dir(&config.staging_dir(&image)).join("app.yaml");
        let contents = fs::read_to_string(&descriptor_file).unwrap();
        assert!(contents.contains("name: myinst"));
        assert!(!contents.contains("name: app"));
        fs::remove_dir_all(&home).unwrap();
    })
}

#[test]
fn failed_submission_releases_staging_by_default() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("release");
        let config = Config::with_home(home.clone())
            .with_runtime_program("true")
            .with_orchestrator_program("false");
        let image: ImageReference = "org/app:1.0.0".parse().unwrap();
        write_bundle(&config, &image, "public function build() {\n}\n", DESCRIPTOR);

        match run(&config, &NoFetch, &image, &RunOptions::default()).await {
            Err(RunError::CommandFailed { program, .. }) => assert_eq!(program, "false"),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(!config.staging_dir(&image).exists());
        fs::remove_dir_all(&home).unwrap();
    })
}

#[test]
fn explicit_instance_name_rewrites_without_entry_point() {
    init();
    Runtime::new().unwrap().block_on(async {
        let home = temp_home("rename");
        let config = Config::with_home(home.clone())
            .keep_failed()
            .with_orchestrator_program("false");
        let image: ImageReference = "org/app:1.0.0".parse().unwrap();
        write_bundle(&config, &image, "public function build() {\n}\n", DESCRIPTOR);

        let options = RunOptions {
            instance_name: Some("renamed".to_owned()),
            dependencies: Vec::new(),
        };
        assert!(run(&config, &NoFetch, &image, &options).await.is_err());

        let descriptor_file =
            Config::bundle_descriptor_dir(&config.staging_dir(&image)).join("app.yaml");
        let contents = fs::read_to_string(&descriptor_file).unwrap();
        assert!(contents.contains("name: renamed"));
        fs::remove_dir_all(&home).unwrap();
    })
}
