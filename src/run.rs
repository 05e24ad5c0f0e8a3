//! The deployment orchestration sequence

use crate::{
    config::Config,
    deps, descriptor,
    errors::RunError,
    exec::{self, bold},
    fetch::Fetcher,
    image::ImageReference,
    source, stage,
};

/// Caller-supplied options for one deployment
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Explicit instance name; the image name is used when unset
    pub instance_name: Option<String>,
    /// Dependency links as raw `key:value` entries
    pub dependencies: Vec<String>,
}

/// Stage `image`, optionally execute its run entry point, and apply its
/// deployment descriptor to the cluster
///
/// The sequence is strictly ordered: stage, detect the entry point, execute
/// it if present, rewrite the descriptor's instance name, submit, clean up.
/// Any failure aborts the whole invocation; staged directories are released
/// on every exit path unless the configuration keeps failures for
/// inspection.
pub async fn run(
    config: &Config,
    fetcher: &dyn Fetcher,
    image: &ImageReference,
    options: &RunOptions,
) -> Result<(), RunError> {
    println!("Running cell image: {}", bold(image.as_str()));

    let (staged, guard) = stage::stage(config, fetcher, image).await?;

    let source_file = source::find_source_file(&staged.source_dir)?;
    let instance_name = options
        .instance_name
        .clone()
        .unwrap_or_else(|| image.name().to_owned());

    let ran_entry_point = if source::has_run_entry_point(&source_file)? {
        log::info!("{} executing run entry point", image);
        let args = vec![
            "run".to_owned(),
            format!("{}:run", source_file.display()),
            format!("{}/{}", image.organization(), image.name()),
            image.version().to_owned(),
            instance_name.clone(),
            deps::encode_dependency_map(&options.dependencies)?,
        ];
        exec::stream_command(config.runtime_program(), &args).await?;
        true
    } else {
        log::debug!("{} has no run entry point", image);
        false
    };

    if options.instance_name.is_some() || ran_entry_point {
        descriptor::rewrite_instance_name(&staged.descriptor_file, image.name(), &instance_name)?;
    }

    let args = vec![
        "apply".to_owned(),
        "-f".to_owned(),
        staged.descriptor_dir.display().to_string(),
    ];
    exec::stream_command(config.orchestrator_program(), &args).await?;

    guard.cleanup();

    println!(
        "Successfully deployed cell image: {}",
        bold(image.as_str())
    );
    println!(
        "What's next? Run `{} get cells` to list running cells.",
        config.orchestrator_program()
    );
    Ok(())
}
