use std::io::{self, IsTerminal, Read};

pub struct InputCollector;

impl InputCollector {
    pub fn stdin_is_terminal() -> bool {
        io::stdin().is_terminal()
    }

    /// Read piped STDIN as a task description.
    pub fn collect_task() -> Result<String, io::Error> {
        let mut content = Vec::new();
        io::stdin().read_to_end(&mut content)?;

        Self::task_from_bytes(&content)
    }

    fn task_from_bytes(content: &[u8]) -> Result<String, io::Error> {
        if content.contains(&b'\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "input looks binary; expected a text task description",
            ));
        }

        let text = std::str::from_utf8(content)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

        Ok(text.trim().to_string())
    }
}
