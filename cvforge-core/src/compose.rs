//! Document Composer - Single Entry Point
//!
//! Straight-line transformation from content + config to rows. Nothing in
//! here fails: missing icons, fonts or renderers degrade and are logged.

use serde::Serialize;

use crate::backend::{BackendError, DocumentBackend};
use crate::commands::{
    Column, ImageSpec, LineSpec, Orientation, Primitive, Row, TextSpec, GRID_COLUMNS,
};
use crate::config::{DocumentConfig, SectionTemplate, CONTACT_SECTION, HEADER_SECTION};
use crate::content::{ContactField, Content, SectionPayload, TemplateContext};
use crate::icons::{IconPipeline, IconStats};
use crate::sections::{RendererRegistry, SectionStyle};
use crate::style::{ResolvedFont, StyleResolver};

pub const HEADER_FONT: &str = "header";
pub const SECTION_TITLE_FONT: &str = "section_title";
pub const EMPHASIS_FONT: &str = "emphasis";
pub const LINK_COLOR: &str = "link";

/// Contact fields per row
pub const CONTACT_COLUMNS: usize = 3;
const CONTACT_CELL: u8 = GRID_COLUMNS / CONTACT_COLUMNS as u8;
const ICON_CELL: u8 = 1;

/// An enabled, data-bearing section ready to render
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub key: &'a str,
    pub type_tag: &'a str,
    pub template: &'a str,
    pub title: &'a str,
    pub icon: Option<&'a str>,
    pub order: i64,
    /// Position in the config's `sections` table
    pub index: usize,
    pub payload: &'a SectionPayload,
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub rows: Vec<Row>,
    pub rendered_sections: Vec<String>,
    pub skipped_sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeSummary {
    pub rows: usize,
    pub rendered_sections: Vec<String>,
    pub skipped_sections: Vec<String>,
    pub icons: IconStats,
}

/// Enabled sections that have content, in render order.
///
/// Sorting is stable on `(order, declaration index)`.
pub fn ordered_sections<'a>(config: &'a DocumentConfig, content: &'a Content) -> Vec<Section<'a>> {
    let mut sections: Vec<Section<'a>> = config
        .sections
        .iter()
        .enumerate()
        .filter(|(_, (key, cfg))| {
            cfg.enabled && key.as_str() != HEADER_SECTION && key.as_str() != CONTACT_SECTION
        })
        .filter_map(|(index, (key, cfg))| {
            let payload = content.sections.get(key).filter(|p| p.has_data())?;
            Some(Section {
                key,
                type_tag: cfg.type_tag(key),
                template: cfg.template_name(key),
                title: &cfg.title,
                icon: cfg.icon.as_deref().filter(|i| !i.is_empty()),
                order: cfg.order,
                index,
                payload,
            })
        })
        .collect();

    sections.sort_by_key(|s| (s.order, s.index));
    sections
}

pub struct Composer<'a> {
    config: &'a DocumentConfig,
    styles: StyleResolver<'a>,
    registry: RendererRegistry,
    icons: IconPipeline<'a>,
}

impl<'a> Composer<'a> {
    pub fn new(config: &'a DocumentConfig) -> Self {
        Self::with_registry(config, RendererRegistry::default())
    }

    pub fn with_registry(config: &'a DocumentConfig, registry: RendererRegistry) -> Self {
        Self {
            config,
            styles: StyleResolver::new(config),
            registry,
            icons: IconPipeline::from_document(config),
        }
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn icon_stats(&self) -> IconStats {
        self.icons.stats()
    }

    /// Compose the document and return its rows.
    pub fn compose(&mut self, content: &Content) -> Composition {
        let ctx = TemplateContext::new(content);
        let mut rows = vec![];

        if self.config.block_enabled(HEADER_SECTION) {
            rows.extend(self.header_row(content));
        }

        if self.config.block_enabled(CONTACT_SECTION) {
            rows.extend(self.contact_rows(content, &ctx));
            if self.config.pdf.divider.enabled {
                rows.push(self.divider_row());
            }
        }

        let mut rendered_sections = vec![];
        let mut skipped_sections = vec![];

        for section in ordered_sections(self.config, content) {
            let Some(renderer) = self.registry.get(section.type_tag) else {
                log::debug!(
                    "no renderer for section '{}' (type '{}'), skipping",
                    section.key,
                    section.type_tag
                );
                skipped_sections.push(section.key.to_string());
                continue;
            };

            let template = self.config.template(section.template);
            rows.extend(self.section_title_row(&section, &template));

            let style = self.section_style(&template);
            rows.extend(renderer.render(section.payload, &style));
            rendered_sections.push(section.key.to_string());
        }

        log::debug!(
            "composed {} rows ({} sections, {} skipped)",
            rows.len(),
            rendered_sections.len(),
            skipped_sections.len()
        );

        Composition {
            rows,
            rendered_sections,
            skipped_sections,
        }
    }

    /// Compose and hand every row to `backend`.
    ///
    /// Only backend failures are reported; composition itself cannot fail.
    pub fn compose_into(
        &mut self,
        content: &Content,
        backend: &mut dyn DocumentBackend,
    ) -> Result<ComposeSummary, BackendError> {
        let composition = self.compose(content);
        let row_count = composition.rows.len();

        backend.begin(&self.config.pdf)?;
        for row in composition.rows {
            backend.add_row(row)?;
        }
        backend.finish()?;

        Ok(ComposeSummary {
            rows: row_count,
            rendered_sections: composition.rendered_sections,
            skipped_sections: composition.skipped_sections,
            icons: self.icons.stats(),
        })
    }

    fn header_row(&self, content: &Content) -> Option<Row> {
        let name = content.personal.name.trim();
        if name.is_empty() {
            return None;
        }
        let font = self.styles.font(HEADER_FONT);
        let spacing = self.styles.spacing(&self.config.template(HEADER_SECTION).spacing);
        Some(Row::text(spacing, TextSpec::new(name, &font).offset(5.0, 0.0)))
    }

    fn contact_rows(&mut self, content: &Content, ctx: &TemplateContext) -> Vec<Row> {
        let template = self.config.template(CONTACT_SECTION);
        let spacing = self.styles.spacing(&template.spacing);
        let font = self.styles.font(&template.font);

        content
            .contact_fields
            .chunks(CONTACT_COLUMNS)
            .filter_map(|group| {
                let columns: Vec<Column> = group
                    .iter()
                    .flat_map(|field| self.contact_columns(field, ctx, &font, &template))
                    .collect();
                if columns.is_empty() {
                    None
                } else {
                    Some(Row { height: spacing, columns })
                }
            })
            .collect()
    }

    /// Icon column (if available) followed by the text column; nothing for blank fields.
    fn contact_columns(
        &mut self,
        field: &ContactField,
        ctx: &TemplateContext,
        font: &ResolvedFont,
        template: &SectionTemplate,
    ) -> Vec<Column> {
        let text = ctx.resolve(&field.content);
        if text.trim().is_empty() {
            return vec![];
        }

        let mut spec = TextSpec::new(text, font).offset(1.0, 0.0);
        if field.is_link() {
            if let Some(link) = &field.link {
                spec = spec.link(ctx.resolve(link), self.styles.color(LINK_COLOR));
            }
        }

        let mut columns = vec![];
        let mut text_weight = CONTACT_CELL;
        if let Some(path) = self.icons.ensure_default(&field.icon) {
            columns.push(icon_column(path, template));
            text_weight -= ICON_CELL;
        } else if !field.icon.is_empty() {
            log::debug!("contact field '{}' rendered without icon", field.field);
        }
        columns.push(Column {
            weight: text_weight,
            primitive: Primitive::Text(spec),
        });
        columns
    }

    fn divider_row(&self) -> Row {
        let divider = &self.config.pdf.divider;
        Row::new(self.styles.spacing(&divider.spacing)).with_column(
            GRID_COLUMNS,
            Primitive::Line(LineSpec {
                color: self.styles.color(&divider.color),
                thickness: divider.thickness,
                orientation: Orientation::Horizontal,
                size_percent: 100.0,
                offset_percent: 50.0,
            }),
        )
    }

    fn section_title_row(&mut self, section: &Section<'_>, template: &SectionTemplate) -> Option<Row> {
        if section.title.is_empty() {
            return None;
        }

        let mut row = Row::new(self.styles.spacing(&template.title_spacing));
        let mut title_weight = GRID_COLUMNS;

        if let Some(icon) = section.icon {
            if let Some(path) = self.icons.ensure_default(icon) {
                row.columns.push(icon_column(path, template));
                title_weight -= ICON_CELL;
            }
        }

        let font = self.styles.font(SECTION_TITLE_FONT);
        row.columns.push(Column {
            weight: title_weight,
            primitive: Primitive::Text(TextSpec::new(section.title, &font).offset(0.0, 3.0)),
        });
        Some(row)
    }

    fn section_style(&self, template: &SectionTemplate) -> SectionStyle {
        SectionStyle {
            body: self.styles.font(&template.font),
            emphasis: self.styles.font(EMPHASIS_FONT),
            spacing: self.styles.spacing(&template.spacing),
            item_spacing: self.styles.spacing(&template.item_spacing),
        }
    }
}

fn icon_column(path: std::path::PathBuf, template: &SectionTemplate) -> Column {
    Column {
        weight: ICON_CELL,
        primitive: Primitive::Image(ImageSpec {
            path,
            percent: template.icon_percent() as f64,
            top: 1.0,
            left: 0.0,
        }),
    }
}

/// Compose with the default registry
pub fn compose_document(content: &Content, config: &DocumentConfig) -> Vec<Row> {
    Composer::new(config).compose(content).rows
}
