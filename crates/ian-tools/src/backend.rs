use async_trait::async_trait;

/// Injected collaborator that the built-in tool facades delegate real work
/// to. The facades themselves only carry the name/schema/approval contract;
/// this trait is where filesystem, shell, and network access actually lives,
/// so it can be swapped for a sandboxed or test implementation.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn read_file(&self, path: &str, offset: Option<usize>, limit: Option<usize>) -> Result<String, String>;

    async fn write_file(&self, path: &str, content: &str) -> Result<String, String>;

    async fn list_files(&self, path: &str) -> Result<String, String>;

    async fn run_shell(&self, command: &str) -> Result<String, String>;

    async fn web_search(&self, query: &str, max_results: usize) -> Result<String, String>;
}

/// In-memory `ToolBackend` for unit tests. Reads/lists are served from a
/// fixed map instead of the real filesystem; shell and search calls just
/// echo back their input so tests can assert on the facade plumbing alone.
#[cfg(test)]
pub struct FakeToolBackend {
    pub files: std::collections::HashMap<String, String>,
}

#[cfg(test)]
#[async_trait]
impl ToolBackend for FakeToolBackend {
    async fn read_file(&self, path: &str, offset: Option<usize>, limit: Option<usize>) -> Result<String, String> {
        let content = self.files.get(path).ok_or_else(|| format!("no such file: {path}"))?;
        if offset.is_none() && limit.is_none() {
            return Ok(content.clone());
        }
        let start = offset.unwrap_or(0);
        let lines: Vec<&str> = content.lines().skip(start).collect();
        let lines = if let Some(n) = limit { &lines[..n.min(lines.len())] } else { &lines[..] };
        Ok(lines.join("\n"))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<String, String> {
        Ok(format!("wrote {} bytes to {path}", content.len()))
    }

    async fn list_files(&self, path: &str) -> Result<String, String> {
        let names: Vec<&str> = self
            .files
            .keys()
            .filter(|k| k.starts_with(path))
            .map(|k| k.as_str())
            .collect();
        Ok(names.join("\n"))
    }

    async fn run_shell(&self, command: &str) -> Result<String, String> {
        Ok(format!("ran: {command}"))
    }

    async fn web_search(&self, query: &str, max_results: usize) -> Result<String, String> {
        Ok(format!("{max_results} results for: {query}"))
    }
}
