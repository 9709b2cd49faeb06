//! Arbor Render — package-level views of the dependency graph
//!
//! Renders a graph into serialized text (JSON or PlantUML) per configured
//! view, and merges two independently rendered texts into a diff view
//! where created, deleted, and changed edges are marked.

pub mod json;
pub mod plantuml;


use arbor_core::{path, GraphEntity, RenderFormat, RenderOptions, Result, View};

/// Text renderer for one output format.
pub trait Renderer: Send + Sync {
    fn file_extension(&self) -> &'static str;

    /// Render one view of the graph.
    fn render_view(&self, graph: &GraphEntity, view: &View, options: &RenderOptions) -> String;

    /// Merge a locally rendered view with a remotely rendered one:
    /// edges only local are marked created (`+count`), edges only remote
    /// are marked deleted (`-count`), edges in both show the difference.
    fn merge(&self, local: &str, remote: &str) -> String;

    /// Render the same view for both graphs and merge the results.
    fn render_diff_view(
        &self,
        local: &GraphEntity,
        remote: &GraphEntity,
        view: &View,
        options: &RenderOptions,
    ) -> String {
        let local_text = self.render_view(local, view, options);
        let remote_text = self.render_view(remote, view, options);
        self.merge(&local_text, &remote_text)
    }
}

/// Select the renderer for a format.
pub fn renderer_for(format: RenderFormat) -> Box<dyn Renderer> {
    match format {
        RenderFormat::Json => Box::new(json::JsonRenderer),
        RenderFormat::PlantUml => Box::new(plantuml::PlantUmlRenderer),
    }
}

/// Render every view of `options` and write one file per view.
pub async fn render_views_to_files(
    renderer: &dyn Renderer,
    graph: &GraphEntity,
    options: &RenderOptions,
) -> Result<()> {
    for view in &options.views {
        let content = renderer.render_view(graph, view, options);
        save_view_to_file(renderer, &content, view, options).await?;
    }
    Ok(())
}

/// Render every view as a local/remote diff and write one file per view.
pub async fn render_diff_views_to_files(
    renderer: &dyn Renderer,
    local: &GraphEntity,
    remote: &GraphEntity,
    options: &RenderOptions,
) -> Result<()> {
    for view in &options.views {
        let content = renderer.render_diff_view(local, remote, view, options);
        save_view_to_file(renderer, &content, view, options).await?;
    }
    Ok(())
}

async fn save_view_to_file(
    renderer: &dyn Renderer,
    content: &str,
    view: &View,
    options: &RenderOptions,
) -> Result<()> {
    tokio::fs::create_dir_all(&options.save_location).await?;
    let filename = format!(
        "{}-{}.{}",
        options.base.project_name,
        view.name,
        renderer.file_extension()
    );
    let file = options.save_location.join(filename);
    tokio::fs::write(&file, content).await?;
    tracing::info!("wrote view '{}' to {}", view.name, file.display());
    Ok(())
}

/// Whether a view leaves this entity out, by name or by path.
pub(crate) fn is_ignored(view: &View, entity: &GraphEntity) -> bool {
    view.ignore_packages
        .iter()
        .any(|ignored| ignored == entity.name() || ignored == entity.path())
}

/// Package identifier of an entity: its dot-separated canonical path, or
/// its display name at the root.
pub(crate) fn package_id(entity: &GraphEntity) -> String {
    let id = path::dot_separated(entity.path());
    if id.is_empty() {
        entity.name().to_string()
    } else {
        id
    }
}

/// The subtrees a view renders: its focus packages with their depths, or
/// every directory child of the root at depth 0.
pub(crate) fn view_scopes<'g>(graph: &'g GraphEntity, view: &View) -> Vec<(&'g GraphEntity, u32)> {
    if !view.packages.is_empty() {
        view.packages
            .iter()
            .filter_map(|p| graph.find_by_path(&p.path).map(|e| (e, p.depth)))
            .collect()
    } else {
        graph
            .children()
            .iter()
            .filter(|c| !c.is_file())
            .map(|c| (c, 0))
            .collect()
    }
}

/// First rendered package a dependency identifier belongs to: an exact
/// name match, or the package whose dotted prefix it extends.
pub(crate) fn match_package<'a>(names: &'a [String], dep: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|name| {
            !name.is_empty() && (dep == name.as_str() || dep.starts_with(&format!("{name}.")))
        })
        .map(|s| s.as_str())
}
