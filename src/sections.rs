//! Thematic sections of a notice page.
//!
//! About fifty optional descriptive fields are grouped into eleven fixed
//! sections. A section is emitted only when at least one of its fields is
//! non-empty, and then only the populated fields are listed, each under its
//! fixed label. Every emitted section is wrapped in a collapsible container
//! toggled client-side.
//!
//! The people/functions list gets its own treatment: beyond
//! [`PEOPLE_PAGE_SIZE`] entries it is split into pages for client-side
//! pagination.

use crate::markup::escape;
use crate::models::{PersonFunction, Record};
use crate::text::render_lines;

/// Number of people/function entries per pagination page.
pub const PEOPLE_PAGE_SIZE: usize = 7;

/// One labeled field inside a section.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Multi-line fields go through line splitting.
    pub multiline: bool,
}

/// A thematic grouping of fields.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    /// Stable key, used for the container id.
    pub key: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

const fn single(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        multiline: false,
    }
}

const fn multi(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        multiline: true,
    }
}

pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "incipits",
        title: "Incipits",
        fields: &[
            multi("incipit_litt", "Incipit littéraire"),
            multi("incipit_mus", "Incipit musical"),
            single("premier_vers", "Premier vers"),
            multi("refrain", "Refrain"),
        ],
    },
    SectionSpec {
        key: "effectif",
        title: "Effectif",
        fields: &[
            single("effectif_vocal", "Effectif vocal"),
            single("effectif_instr", "Effectif instrumental"),
            single("voix", "Voix"),
            multi("instruments", "Instruments"),
            single("tonalite", "Tonalité"),
        ],
    },
    SectionSpec {
        key: "sources",
        title: "Sources",
        fields: &[
            multi("notice_bibl", "Notice bibliographique"),
            multi("srce_notes", "Notes sur la source"),
            multi("sources_ms", "Sources manuscrites"),
            multi("sources_imp", "Sources imprimées"),
            single("rism", "RISM"),
        ],
    },
    SectionSpec {
        key: "texte",
        title: "Informations textuelles",
        fields: &[
            single("auteur_texte", "Auteur du texte"),
            multi("source_texte", "Source du texte"),
            single("langue", "Langue"),
            single("forme_poetique", "Forme poétique"),
            multi("texte_notes", "Notes sur le texte"),
        ],
    },
    SectionSpec {
        key: "references",
        title: "Références et catalogues",
        fields: &[
            single("catalogue", "Catalogue"),
            multi("bibliographie", "Bibliographie"),
            multi("editions_modernes", "Éditions modernes"),
            multi("discographie", "Discographie"),
        ],
    },
    SectionSpec {
        key: "scene",
        title: "Production scénique",
        fields: &[
            single("lieu_creation", "Lieu de création"),
            single("date_creation", "Date de création"),
            multi("mise_en_scene", "Mise en scène"),
            multi("decors", "Décors et costumes"),
            multi("interpretes_creation", "Interprètes de la création"),
        ],
    },
    SectionSpec {
        key: "dates",
        title: "Dates et lieux",
        fields: &[
            single("date_composition", "Date de composition"),
            single("lieu_composition", "Lieu de composition"),
            single("date_copie", "Date de copie"),
            single("date_edition", "Date d'édition"),
            single("lieu_edition", "Lieu d'édition"),
        ],
    },
    SectionSpec {
        key: "liturgie",
        title: "Liturgie",
        fields: &[
            single("fete", "Fête"),
            single("office", "Office"),
            single("temps_liturgique", "Temps liturgique"),
            multi("usage_liturgique", "Usage liturgique"),
        ],
    },
    SectionSpec {
        key: "roles",
        title: "Rôles et noms cités",
        fields: &[
            multi("roles", "Rôles"),
            multi("personnages", "Personnages"),
            multi("noms_cites", "Noms cités"),
            single("dedicataire", "Dédicataire"),
        ],
    },
    SectionSpec {
        key: "notes",
        title: "Notes et attribution",
        fields: &[
            single("attribution", "Attribution"),
            multi("attribution_notes", "Notes sur l'attribution"),
            multi("notes", "Notes"),
            multi("remarques", "Remarques"),
        ],
    },
    SectionSpec {
        key: "auteur",
        title: "Auteur de la notice",
        fields: &[
            single("auteur_notice", "Rédacteur"),
            single("date_notice", "Date de rédaction"),
            single("contributeurs", "Contributeurs"),
        ],
    },
];

impl SectionSpec {
    /// Whether any field of the section is populated on `record`.
    pub fn is_present(&self, record: &Record) -> bool {
        self.fields.iter().any(|f| record.has(f.name))
    }
}

/// Wrap content in a collapsible container with a heading.
pub fn collapsible(key: &str, title: &str, content: &str) -> String {
    format!(
        "<section class=\"collapsible\" id=\"section-{key}\">\n\
         <h2 class=\"collapsible-header\"><button type=\"button\" class=\"collapsible-toggle\" aria-expanded=\"false\">{title}</button></h2>\n\
         <div class=\"collapsible-content\">\n{content}</div>\n\
         </section>\n",
        key = escape(key),
        title = escape(title),
        content = content
    )
}

fn render_field(record: &Record, field: &FieldSpec) -> String {
    let value = record.field(field.name).trim();
    let rendered = if field.multiline {
        render_lines(value)
    } else {
        escape(value)
    };
    format!("<dt>{}</dt><dd>{}</dd>\n", escape(field.label), rendered)
}

/// Render one section, or `None` when none of its fields is populated.
pub fn render_section(record: &Record, section: &SectionSpec) -> Option<String> {
    if !section.is_present(record) {
        return None;
    }
    let mut entries = String::from("<dl class=\"fields\">\n");
    for field in section.fields.iter().filter(|f| record.has(f.name)) {
        entries.push_str(&render_field(record, field));
    }
    entries.push_str("</dl>\n");
    Some(collapsible(section.key, section.title, &entries))
}

/// Render every populated section, in fixed order.
pub fn render_sections(record: &Record) -> String {
    SECTIONS
        .iter()
        .filter_map(|section| render_section(record, section))
        .collect()
}

fn person_entry(person: &PersonFunction) -> String {
    let name = person.name.trim();
    let function = person.function.trim();
    if function.is_empty() {
        format!("<span class=\"person\">{}</span>", escape(name))
    } else {
        format!(
            "<span class=\"person\">{}</span> <span class=\"function\">({})</span>",
            escape(name),
            escape(function)
        )
    }
}

/// Number of pagination pages for `len` entries.
pub fn people_page_count(len: usize) -> usize {
    len.div_ceil(PEOPLE_PAGE_SIZE)
}

/// Render the people/functions list, paginated past [`PEOPLE_PAGE_SIZE`].
///
/// Returns an empty string for an empty list.
pub fn render_people(people: &[PersonFunction]) -> String {
    if people.is_empty() {
        return String::new();
    }

    if people.len() <= PEOPLE_PAGE_SIZE {
        let items: String = people
            .iter()
            .map(|p| format!("<li>{}</li>\n", person_entry(p)))
            .collect();
        return format!("<ul class=\"people\">\n{}</ul>\n", items);
    }

    let total = people_page_count(people.len());
    let mut html = format!(
        "<ul class=\"people paginated\" data-total-pages=\"{}\">\n",
        total
    );
    for (idx, person) in people.iter().enumerate() {
        let page = idx / PEOPLE_PAGE_SIZE + 1;
        let hidden = if page > 1 { " hidden" } else { "" };
        html.push_str(&format!(
            "<li data-page=\"{}\"{}>{}</li>\n",
            page,
            hidden,
            person_entry(person)
        ));
    }
    html.push_str("</ul>\n");

    html.push_str(&format!(
        "<nav class=\"people-pagination\" data-total-pages=\"{}\">",
        total
    ));
    for page in 1..=total {
        let current = if page == 1 { " aria-current=\"page\"" } else { "" };
        html.push_str(&format!(
            "<button type=\"button\" data-page=\"{}\"{}>{}</button>",
            page, current, page
        ));
    }
    html.push_str("</nav>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nature;

    fn stage_section() -> &'static SectionSpec {
        SECTIONS.iter().find(|s| s.key == "scene").unwrap()
    }

    fn people(n: usize) -> Vec<PersonFunction> {
        (1..=n)
            .map(|i| PersonFunction {
                name: format!("Person {}", i),
                function: "chanteur".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_eleven_sections() {
        assert_eq!(SECTIONS.len(), 11);
        assert_eq!(stage_section().fields.len(), 5);
    }

    #[test]
    fn test_section_keys_unique() {
        let mut keys: Vec<&str> = SECTIONS.iter().map(|s| s.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SECTIONS.len());
    }

    #[test]
    fn test_empty_section_omitted() {
        let record = Record::new(Nature::Oeuvre).with("lieu_creation", "   ");
        assert!(render_section(&record, stage_section()).is_none());
        assert!(!render_sections(&record).contains("section-scene"));
    }

    #[test]
    fn test_single_field_section() {
        let record = Record::new(Nature::Oeuvre).with("decors", "Berain");
        let html = render_section(&record, stage_section()).unwrap();
        assert!(html.contains("id=\"section-scene\""));
        assert!(html.contains("Production scénique"));
        assert!(html.contains("<dt>Décors et costumes</dt><dd>Berain</dd>"));
        assert_eq!(html.matches("<dt>").count(), 1);
    }

    #[test]
    fn test_multiline_field_split() {
        let record = Record::new(Nature::Oeuvre).with("notes", "ligne 1\r\nligne 2");
        let html = render_sections(&record);
        assert!(html.contains("<dd>ligne 1<br/>ligne 2</dd>"));
    }

    #[test]
    fn test_single_line_field_escaped_not_split() {
        let record = Record::new(Nature::Oeuvre).with("tonalite", "ré <mineur>");
        let html = render_sections(&record);
        assert!(html.contains("<dd>ré &lt;mineur&gt;</dd>"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let record = Record::new(Nature::Oeuvre)
            .with("auteur_notice", "X")
            .with("incipit_litt", "Y");
        let html = render_sections(&record);
        let incipits = html.find("section-incipits").unwrap();
        let auteur = html.find("section-auteur").unwrap();
        assert!(incipits < auteur);
    }

    #[test]
    fn test_people_seven_unpaginated() {
        let html = render_people(&people(7));
        assert!(html.starts_with("<ul class=\"people\">"));
        assert!(!html.contains("data-page"));
        assert_eq!(html.matches("<li>").count(), 7);
    }

    #[test]
    fn test_people_eight_two_pages() {
        let html = render_people(&people(8));
        assert!(html.contains("data-total-pages=\"2\""));
        assert_eq!(html.matches("<li data-page=\"1\">").count(), 7);
        assert_eq!(html.matches("<li data-page=\"2\" hidden>").count(), 1);
        assert!(html.contains("<li data-page=\"2\" hidden><span class=\"person\">Person 8</span>"));
        assert_eq!(html.matches("<button").count(), 2);
    }

    #[test]
    fn test_people_page_count() {
        assert_eq!(people_page_count(1), 1);
        assert_eq!(people_page_count(7), 1);
        assert_eq!(people_page_count(8), 2);
        assert_eq!(people_page_count(14), 2);
        assert_eq!(people_page_count(15), 3);
    }

    #[test]
    fn test_person_without_function() {
        let html = render_people(&[PersonFunction {
            name: "Anonyme".to_string(),
            function: String::new(),
        }]);
        assert!(html.contains("<li><span class=\"person\">Anonyme</span></li>"));
    }

    #[test]
    fn test_empty_people() {
        assert_eq!(render_people(&[]), "");
    }
}
