//! Project note management commands.

use clap::Subcommand;
use easenotes_core::storage::Database;
use easenotes_core::Project;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project note
    Create {
        /// Project title
        title: String,
        /// Free-text content
        #[arg(long, default_value = "")]
        content: String,
        /// Repeating timer interval in minutes
        #[arg(long)]
        interval: Option<u32>,
    },
    /// List all projects
    List,
    /// Show a single project
    Show {
        /// Project id
        id: String,
    },
    /// Edit a project's title, content, or timer interval
    Edit {
        /// Project id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// New timer interval in minutes; 0 detaches the timer
        #[arg(long)]
        interval: Option<u32>,
    },
    /// Delete a project
    Delete {
        /// Project id
        id: String,
    },
    /// Insert sample projects for a quick look around
    Seed,
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProjectAction::Create { title, content, interval } => {
            if interval == Some(0) {
                return Err("timer interval must be a positive number of minutes".into());
            }
            let mut project = Project::new(title, content);
            project.timer_interval_min = interval;
            db.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Show { id } => {
            let project = db.get_project(&id)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Edit { id, title, content, interval } => {
            let mut project = db.get_project(&id)?;
            if let Some(title) = title {
                project.title = title;
            }
            if let Some(content) = content {
                project.content = content;
            }
            if let Some(interval) = interval {
                project.timer_interval_min = if interval == 0 { None } else { Some(interval) };
            }
            db.update_project(&project)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Delete { id } => {
            db.delete_project(&id)?;
            println!("Project deleted: {id}");
        }
        ProjectAction::Seed => {
            let projects = Project::mock_data();
            for project in &projects {
                db.create_project(project)?;
            }
            println!("Seeded {} sample projects", projects.len());
        }
    }
    Ok(())
}
