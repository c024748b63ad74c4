//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use localai_core::config::STATE_DIR;
use localai_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Path of the override file for a prompt ID.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// Looks for `<id>.yml` in the `.localai/prompts/` directory.
///
/// # Example
/// ```no_run
/// use localai_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "query.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a workspace override if present, otherwise the built-in definition.
pub fn load_prompt_or_default(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).exists() {
        load_prompt(workspace_path, prompt_id)
    } else {
        tracing::debug!("No override for prompt '{}', using built-in", prompt_id);
        Ok(PromptDefinition {
            id: prompt_id.to_string(),
            ..PromptDefinition::default()
        })
    }
}

/// Validate required fields of a prompt definition.
fn validate_prompt(definition: &PromptDefinition) -> AppResult<()> {
    if definition.id.trim().is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if definition.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' has an empty template",
            definition.id
        )));
    }

    if !definition.template.contains("{{query}}") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' template must reference {{{{query}}}}",
            definition.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TEMPLATE;
    use tempfile::TempDir;

    fn write_prompt(workspace: &Path, id: &str, body: &str) {
        let path = prompt_path(workspace, id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_load_prompt_missing() {
        let temp = TempDir::new().unwrap();
        let err = load_prompt(temp.path(), "query.default").unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }

    #[test]
    fn test_default_when_no_override() {
        let temp = TempDir::new().unwrap();
        let def = load_prompt_or_default(temp.path(), "query.default").unwrap();
        assert_eq!(def.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_override_is_loaded() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            "query.default",
            "id: query.default\ntitle: Custom\ntemplate: \"{{context}}Q: {{query}}\"\n",
        );

        let def = load_prompt_or_default(temp.path(), "query.default").unwrap();
        assert_eq!(def.title, "Custom");
        assert_eq!(def.template, "{{context}}Q: {{query}}");
    }

    #[test]
    fn test_override_without_query_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            "query.default",
            "id: query.default\ntitle: Broken\ntemplate: \"{{context}}\"\n",
        );

        assert!(load_prompt(temp.path(), "query.default").is_err());
    }
}
