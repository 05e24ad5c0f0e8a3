use cellrun::{errors::RunError, exec::stream_command};
use tokio::runtime::Runtime;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn zero_exit_is_ok() {
    init();
    Runtime::new().unwrap().block_on(async {
        stream_command("true", &[]).await.unwrap();
    })
}

#[test]
fn output_lines_are_drained() {
    init();
    Runtime::new().unwrap().block_on(async {
        stream_command("echo", &["hello".to_owned(), "cell".to_owned()])
            .await
            .unwrap();
    })
}

#[test]
fn nonzero_exit_is_reported() {
    init();
    Runtime::new().unwrap().block_on(async {
        match stream_command("false", &[]).await {
            Err(RunError::CommandFailed { program, status }) => {
                assert_eq!(program, "false");
                assert!(!status.success());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    })
}

#[test]
fn missing_program_fails_at_spawn() {
    init();
    Runtime::new().unwrap().block_on(async {
        match stream_command("cellrun-no-such-program", &[]).await {
            Err(RunError::SpawnFailed { program, .. }) => {
                assert_eq!(program, "cellrun-no-such-program")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    })
}
