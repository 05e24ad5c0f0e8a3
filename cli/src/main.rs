#[macro_use] extern crate clap;

use async_trait::async_trait;
use cellrun::{
    errors::ImageError,
    fetch::{Fetcher, HttpFetcher},
    run::run,
    Config, ImageReference, RunOptions,
};
use clap::{App, ArgMatches};
use env_logger::{from_env, Env};
use indicatif::ProgressBar;
use std::path::Path;

#[tokio::main]
async fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let log_level = matches.value_of("log_level").unwrap();
    from_env(Env::default().default_filter_or(log_level)).init();

    let image: ImageReference = matches
        .value_of("image_reference")
        .unwrap()
        .parse()
        .unwrap_or_else(|err: ImageError| {
            exit_with_error("Error occurred while parsing cell image", &err)
        });

    let mut config = match matches.value_of("home") {
        Some(dir) => Config::with_home(Path::new(dir).to_path_buf()),
        None => Config::new().unwrap_or_else(|err| {
            exit_with_error("Error occurred while locating the tool home", &err)
        }),
    };
    if matches.is_present("offline") {
        config = config.offline();
    }
    if matches.is_present("keep_failed") {
        config = config.keep_failed();
    }

    let fetcher = HttpFetcher::new(matches.value_of("registry_url").unwrap())
        .unwrap_or_else(|err| exit_with_error("Invalid registry URL", &err));
    let fetcher = SpinnerFetcher { inner: fetcher };

    let options = RunOptions {
        instance_name: matches.value_of("instance_name").map(|s| s.to_owned()),
        dependencies: string_values(&matches, "dependencies"),
    };

    if let Err(err) = run(&config, &fetcher, &image, &options).await {
        exit_with_error("Error occurred while deploying cell image", &err);
    }
}

fn string_values<S: AsRef<str>>(matches: &ArgMatches, name: S) -> Vec<String> {
    match matches.values_of(name) {
        Some(values) => values.map(|value| value.to_string()).collect(),
        None => Vec::new(),
    }
}

fn exit_with_error(message: &str, err: &dyn std::error::Error) -> ! {
    eprintln!("{}: {}", message, err);
    std::process::exit(1);
}

/// Shows a spinner for the duration of an archive download
struct SpinnerFetcher {
    inner: HttpFetcher,
}

#[async_trait]
impl Fetcher for SpinnerFetcher {
    async fn fetch(&self, image: &ImageReference, dest: &Path) -> Result<(), ImageError> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(&format!("Pulling image {}", image));
        spinner.enable_steady_tick(100);
        let result = self.inner.fetch(image, dest).await;
        spinner.finish_and_clear();
        result
    }
}
