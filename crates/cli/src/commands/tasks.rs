//! `taskmate tasks` — Print an identity's saved task list without
//! contacting the completion service.

use taskmate_assistant::TaskStore;
use taskmate_storage::FileLayout;

use super::CommandResult;

pub fn run(name: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let name = name.unwrap_or_else(|| config.assistant.default_identity.clone());
    let files = FileLayout::new(&config.storage).for_identity(&name);

    if !files.tasks.exists() {
        println!("No saved tasks for '{name}'.");
        return Ok(());
    }

    let store = TaskStore::load(files.tasks, files.deleted_tasks)?;
    println!("{}", store.list_formatted());
    Ok(())
}
