use crate::tools::Tool;

/// Owns the built-in tool facades and enforces name uniqueness at
/// construction time — a duplicate registration is a programming error,
/// not a runtime condition to recover from.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        for (i, a) in tools.iter().enumerate() {
            for b in &tools[i + 1..] {
                assert!(
                    a.name() != b.name(),
                    "duplicate tool registration: {}",
                    a.name()
                );
            }
        }
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn all(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// The subset of registered tools whose names appear in `allowed`.
    pub fn subset(&self, allowed: &[&str]) -> Vec<&dyn Tool> {
        self.tools
            .iter()
            .filter(|t| allowed.contains(&t.name()))
            .map(|t| t.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FakeToolBackend;
    use crate::tools::filesystem_read::FilesystemReadTool;
    use crate::tools::filesystem_write::FilesystemWriteTool;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn backend() -> Arc<dyn crate::backend::ToolBackend> {
        Arc::new(FakeToolBackend { files: HashMap::new() })
    }

    #[test]
    fn accepts_distinct_tool_names() {
        let registry = ToolRegistry::new(vec![
            Box::new(FilesystemReadTool::new(backend())),
            Box::new(FilesystemWriteTool::new(backend())),
        ]);
        assert!(registry.get("filesystem_read").is_some());
        assert!(registry.get("filesystem_write").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate tool registration")]
    fn panics_on_duplicate_names() {
        ToolRegistry::new(vec![
            Box::new(FilesystemReadTool::new(backend())),
            Box::new(FilesystemReadTool::new(backend())),
        ]);
    }

    #[test]
    fn subset_filters_by_allow_list() {
        let registry = ToolRegistry::new(vec![
            Box::new(FilesystemReadTool::new(backend())),
            Box::new(FilesystemWriteTool::new(backend())),
        ]);
        let subset = registry.subset(&["filesystem_read"]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].name(), "filesystem_read");
    }
}
