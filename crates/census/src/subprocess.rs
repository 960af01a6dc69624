use tokio::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW_FLAG: u32 = 0x08000000;

#[allow(unused_variables)]
pub fn configure_subprocess(command: &mut Command) {
    // Own process group, so a terminal Ctrl+C only reaches the CLI. The CLI
    // catches it and shuts the server down; kill_on_drop covers a dropped
    // handshake.
    #[cfg(unix)]
    command.process_group(0);

    #[cfg(windows)]
    command.creation_flags(CREATE_NO_WINDOW_FLAG);

    command.kill_on_drop(true);
}
