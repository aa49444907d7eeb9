use std::{
    net::TcpStream,
    thread,
    time::Duration,
};

use lpt_parser_core::{LiveScanner, StreamSource, scan_live};

use crate::{
    config::InputSettings,
    output::{JobFileHandler, JobGate},
};

/// Connects to one printer socket and turns everything it prints into job files.
///
/// The emulator drops the connection now and then, even while it keeps running,
/// and may be restarted at any time. So this never returns: after a failed
/// connect or a disconnect it waits `reconnect_delay` and tries again.
pub fn run_input(input: &InputSettings, gate: &JobGate, reconnect_delay: Duration) -> ! {
    let name = input.scanner.name.clone();
    let mut handler = JobFileHandler::new(name.clone(), input.output_dir.clone(), gate);
    loop {
        serve_connection(input, &mut handler);
        log::info!("[{}] retrying connection in {:?}", name, reconnect_delay);
        thread::sleep(reconnect_delay);
    }
}

fn serve_connection(input: &InputSettings, handler: &mut JobFileHandler<'_>) {
    let name = &input.scanner.name;
    log::info!("[{}] connecting to {}", name, input.address);
    let stream = match TcpStream::connect(&input.address) {
        Ok(stream) => stream,
        Err(err) => {
            log::error!("[{}] couldn't connect: {}", name, err);
            return;
        }
    };
    log::info!("[{}] connection successful", name);

    let mut source = StreamSource::new(stream);
    let mut scanner = LiveScanner::new(input.scanner.clone());
    match scan_live(&mut source, &mut scanner, handler) {
        Ok(()) => log::info!("[{}] printer disconnected", name),
        Err(err) => {
            log::error!("[{}] error reading from printer: {}", name, err);
            handler.abandon_job();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, net::TcpListener};

    use lpt_parser_core::ScannerConfig;

    use super::*;

    #[test]
    fn serves_one_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let printer = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            // the separator trailer only counts when LF FF follows it directly
            let mut data = b"\x0CHELLO\r\nWORLD\r\n\x0C".to_vec();
            data.extend_from_slice(b"****A  END   JOB   7  PRINTME   ROOM  1  END  A****\n\x0C");
            data.extend_from_slice(b"\r\x0CTAIL\r\n");
            socket.write_all(&data).unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let mut config = ScannerConfig::named("socket");
        config.idle_timeout = Duration::from_secs(2);
        let input = InputSettings {
            address,
            output_dir: dir.path().to_path_buf(),
            scanner: config,
        };
        let gate = JobGate::new(1);
        let mut handler = JobFileHandler::new("socket", dir.path(), &gate);

        serve_connection(&input, &mut handler);
        printer.join().unwrap();

        let written = handler.written();
        assert_eq!(written.len(), 2);
        let first = std::fs::read_to_string(&written[0]).unwrap();
        assert!(first.starts_with("L:HELLO\nL:WORLD\nL:\nP:\nL:****A"), "{}", first);
        assert!(first.ends_with("J:J7_PRINTME\n"), "{}", first);
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "L:TAIL\n");
    }

    #[test]
    fn refused_connection_returns() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let input = InputSettings {
            address,
            output_dir: dir.path().to_path_buf(),
            scanner: ScannerConfig::named("refused"),
        };
        let gate = JobGate::new(1);
        let mut handler = JobFileHandler::new("refused", dir.path(), &gate);
        serve_connection(&input, &mut handler);
        assert!(handler.written().is_empty());
    }
}
