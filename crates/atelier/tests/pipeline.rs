use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use atelier::app::locations::{LocationManager, Provider};
use atelier::app::providers::ProjectProvider;
use atelier::app::resolver::Resolver;
use atelier::app::selection::{Picker, PickerEvent, Transition};
use atelier::domain::errors::ProviderError;
use atelier::domain::model::{Location, Source};
use atelier::infra::config::Config;
use tokio_util::sync::CancellationToken;

struct Discovered(Location);

#[async_trait]
impl Provider for Discovered {
    fn name(&self) -> &str {
        "discovered"
    }

    async fn fetch(&self) -> Result<Vec<Location>, ProviderError> {
        Ok(vec![self.0.clone()])
    }
}

#[tokio::test]
async fn configured_project_beats_discovered_directory_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("api");
    fs::create_dir_all(&dir).unwrap();
    let canonical = fs::canonicalize(&dir).unwrap();

    let config = Arc::new(
        Config::parse(&format!(
            "[[projects]]\nname = \"api\"\npath = \"{}\"\n",
            dir.display()
        ))
        .unwrap(),
    );
    let discovered = Location {
        name: "api-old".into(),
        path: canonical.clone(),
        source: Source::Zoxide,
        actions: Vec::new(),
    };
    let manager = LocationManager::new(vec![
        Arc::new(ProjectProvider::new(Arc::clone(&config))),
        Arc::new(Discovered(discovered)),
    ]);

    let locations = manager.get_all(&CancellationToken::new()).await.unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].name, "api");
    assert_eq!(locations[0].source, Source::Project);

    let mut picker = Picker::new(locations);
    let Transition::Done(selection) = picker.step(PickerEvent::FastConfirm) else {
        panic!("fast confirm should finish the picker");
    };
    assert!(!selection.canceled);

    let resolver = Resolver::new("/bin/bash", "vim");
    let location = selection.location.as_ref().unwrap();
    let target = resolver.resolve(location, selection.action_name()).unwrap();
    assert_eq!(target.name, "api");
    assert_eq!(target.path, canonical);
    assert_eq!(target.command, resolver.interactive_shell());
}

#[tokio::test]
async fn drilling_into_actions_resolves_the_highlighted_action() {
    let config = Arc::new(
        Config::parse(
            r#"
[[actions]]
name = "build"
command = "make"

[[projects]]
name = "Web App"
path = "/srv/web"

[[projects.actions]]
name = "serve"
command = "npm start"
"#,
        )
        .unwrap(),
    );
    let manager = LocationManager::new(vec![Arc::new(ProjectProvider::new(config))]);
    let locations = manager.get_all(&CancellationToken::new()).await.unwrap();

    let mut picker = Picker::new(locations);
    assert_eq!(picker.step(PickerEvent::Confirm), Transition::Continue);
    picker.step(PickerEvent::CursorDown);
    let Transition::Done(selection) = picker.step(PickerEvent::Confirm) else {
        panic!("confirm in actions should finish the picker");
    };

    let target = Resolver::new("/bin/zsh", "vim")
        .resolve(selection.location.as_ref().unwrap(), selection.action_name())
        .unwrap();
    assert_eq!(target.name, "web-app:serve");
    assert_eq!(
        target.command,
        ["/bin/zsh", "-l", "-i", "-c", "npm start"]
    );
}
