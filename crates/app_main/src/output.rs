//! Plain-text rendering of the gallery view

use app_core::metadata::SectionContent;
use app_core::{BodyView, DetailContent, GalleryView, MetadataView, Tile};
use std::fmt::Write;

pub fn summary(view: &GalleryView) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_summary(&mut out, view)?;
    Ok(out)
}

fn write_summary(out: &mut String, view: &GalleryView) -> std::fmt::Result {
    if view.breadcrumb.visible {
        let crumbs: Vec<&str> = view.breadcrumb.crumbs.iter().map(|c| c.label.as_str()).collect();
        writeln!(out, "{}", crumbs.join(" / "))?;
    }
    writeln!(out, "{}", view.stats)?;
    if let Some(badge) = &view.selection_badge {
        writeln!(out, "{}", badge)?;
    }
    writeln!(out)?;

    match &view.body {
        BodyView::Detail(detail) => {
            match &detail.content {
                DetailContent::Image { source, .. } => writeln!(out, "Showing {}", source)?,
                DetailContent::Empty { message } => writeln!(out, "{}", message)?,
            }
            if let Some(info) = &detail.info {
                writeln!(out, "{} | {} | {}", info.name, info.size, info.modified)?;
            }
            if let Some(metadata) = &detail.metadata {
                write_metadata(out, metadata)?;
            }
            writeln!(out)?;
            write_tiles(out, &detail.strip)?;
        }
        BodyView::Grid(grid) => write_tiles(out, &grid.tiles)?,
    }

    for note in &view.notifications {
        let prefix = if note.is_error { "error" } else { "note" };
        writeln!(out, "[{}] {}", prefix, note.message)?;
    }
    Ok(())
}

fn write_tiles(out: &mut String, tiles: &[Tile]) -> std::fmt::Result {
    for tile in tiles {
        match tile {
            Tile::Folder { name, .. } => writeln!(out, "  [dir] {}", name)?,
            Tile::Image { name, favorite, active, selected, .. } => {
                let marker = if *active { ">" } else if *selected { "*" } else { " " };
                let star = if *favorite { " ★" } else { "" };
                writeln!(out, "{} {}{}", marker, name, star)?;
            }
        }
    }
    Ok(())
}

fn write_metadata(out: &mut String, metadata: &MetadataView) -> std::fmt::Result {
    match metadata {
        MetadataView::Loading => writeln!(out, "Loading metadata..."),
        MetadataView::Error(message) => writeln!(out, "{}", message),
        MetadataView::Sections(sections) => {
            for section in sections.iter().filter(|s| !s.collapsed) {
                writeln!(out, "-- {}", section.title)?;
                match &section.content {
                    SectionContent::Items(items) => {
                        for (key, value) in items {
                            writeln!(out, "   {}: {}", key, value)?;
                        }
                    }
                    SectionContent::Json(json) => writeln!(out, "{}", json)?,
                    SectionContent::Nodes(nodes) => {
                        for node in nodes {
                            let title = node.title.as_deref().unwrap_or(&node.node_type);
                            writeln!(out, "   #{} {}", node.id, title)?;
                        }
                    }
                    SectionContent::Empty(message) => writeln!(out, "   {}", message)?,
                }
            }
            Ok(())
        }
    }
}
