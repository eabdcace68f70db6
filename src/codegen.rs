//! Render registered definitions as C# source.
use crate::ir::{EnumDef, MemberDef, ObjectDef, TypeDefinition};
use crate::naming::escape_literal;
use crate::registry::NamespaceRegistry;

const DEFAULT_USINGS: &[&str] = &[
    "System.ComponentModel.DataAnnotations",
    "System.Runtime.Serialization",
    "System.Text.Json.Serialization",
];

/// Settings that shape the output but not the type graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Extra `using` directives, emitted after the defaults.
    pub usings: Vec<String>,
    /// Converter type for single enum members. `{enum}` expands to the enum name.
    pub enum_converter: Option<String>,
    /// Converter type for enum list members. `{enum}` expands to the enum name.
    pub enum_array_converter: Option<String>,
}

pub struct Codegen<'a> {
    registry: &'a NamespaceRegistry,
    options: &'a EmitOptions,
    out: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'a> Codegen<'a> {
    pub fn new(registry: &'a NamespaceRegistry, options: &'a EmitOptions) -> Self {
        Self {
            registry,
            options,
            out: String::new(),
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Emit the whole compilation unit.
    pub fn emit(&mut self, source_name: &str, namespace: &str) {
        let options = self.options;
        let mut usings: Vec<&str> = DEFAULT_USINGS.to_vec();
        for extra in &options.usings {
            let extra = normalize_using(extra);
            if !extra.is_empty() && !usings.contains(&extra) {
                usings.push(extra);
            }
        }
        for using in usings {
            self.line(0, format!("using {using};"));
        }
        self.blank();
        self.summary(0, &format!("Generated from \"{source_name}\""));
        self.line(0, format!("namespace {namespace};"));
        self.blank();

        let registry = self.registry;
        self.section("EnumDefinitions", registry.enums(), Self::emit_enum);
        self.blank();
        self.section("ValueDefinitions", registry.values(), |cg, def| cg.emit_object(def, "struct"));
        self.blank();
        self.section("ClassDefinitions", registry.classes(), |cg, def| cg.emit_object(def, "class"));
    }

    fn section<T>(&mut self, region: &str, items: impl Iterator<Item = T>, mut emit: impl FnMut(&mut Self, T)) {
        self.line(0, format!("#region {region}"));
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.blank();
            }
            emit(self, item);
        }
        self.line(0, format!("#endregion // {region}"));
    }

    fn emit_enum(&mut self, def: &EnumDef) {
        let annotated = def.needs_member_names();
        self.summary(0, &def.title);
        if annotated {
            self.line(0, "[JsonConverter(typeof(JsonStringEnumConverter))]");
        }
        self.line(0, format!("public enum {}", def.name));
        self.line(0, "{");
        let members = def.members();
        let last = members.len().saturating_sub(1);
        for (code, (ident, raw)) in members.iter().enumerate() {
            if annotated && code > 0 {
                self.blank();
            }
            if ident != raw {
                self.line(1, format!("[JsonStringEnumMemberName(\"{}\")]", escape_literal(raw)));
            }
            let comma = if code == last { "" } else { "," };
            self.line(1, format!("{ident} = {code}{comma}"));
        }
        self.line(0, "}");
    }

    fn emit_object(&mut self, def: &ObjectDef, keyword: &str) {
        self.summary(0, &def.title);
        if let Some(schema) = &def.schema {
            self.line(0, format!("[DataContract(Namespace = \"{}\")]", escape_literal(schema)));
        }
        self.line(0, format!("public {keyword} {}", def.name));
        self.line(0, "{");
        for (i, member) in def.members.iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            self.emit_member(member);
        }

        let arrays: Vec<String> = def.members.iter().filter(|m| m.is_array).map(MemberDef::identifier).collect();
        if !arrays.is_empty() {
            if !def.members.is_empty() {
                self.blank();
            }
            self.line(1, format!("public {}()", def.name));
            self.line(1, "{");
            for ident in arrays {
                self.line(2, format!("{ident} = new();"));
            }
            self.line(1, "}");
        }
        self.line(0, "}");
    }

    fn emit_member(&mut self, member: &MemberDef) {
        let registry = self.registry;
        let ty = registry.resolve(&member.ty);
        let ident = member.identifier();
        let title = member.title.as_deref().or(ty.title()).unwrap_or(&member.name);
        self.summary(1, title);

        if ident != member.name {
            self.line(1, format!("[JsonPropertyName(\"{}\")]", escape_literal(&member.name)));
        }
        if member.is_required {
            self.line(1, "[Required]");
        }
        if let TypeDefinition::Enum(def) = ty {
            let options = self.options;
            let converter = if member.is_array {
                &options.enum_array_converter
            } else {
                &options.enum_converter
            };
            if let Some(converter) = converter {
                let converter = converter.replace("{enum}", &def.name);
                self.line(1, format!("[JsonConverter(typeof({converter}))]"));
            }
        }
        if member.is_array {
            if let Some(min) = member.array.min_items {
                self.line(1, format!("[MinLength({min})]"));
            }
            if let Some(max) = member.array.max_items {
                self.line(1, format!("[MaxLength({max})]"));
            }
        } else if let TypeDefinition::Scalar(scalar) = ty {
            for attribute in scalar.attributes() {
                self.line(1, attribute);
            }
        }

        let type_text = if member.is_array {
            format!("List<{}>", ty.name())
        } else if ty.is_reference_type() {
            format!("{}?", ty.name())
        } else {
            ty.name().to_string()
        };
        self.line(1, format!("public {type_text} {ident} {{ get; set; }}"));
    }

    fn summary(&mut self, indent: usize, text: &str) {
        self.line(indent, "/// <summary>");
        self.line(indent, format!("/// {}", doc_sentence(text)));
        self.line(indent, "/// </summary>");
    }

    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.out.push('\t');
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `using X;`, `X;` and `X` all mean `X`.
fn normalize_using(raw: &str) -> &str {
    let s = raw.trim();
    let s = s.strip_prefix("using ").unwrap_or(s);
    s.trim_end_matches(';').trim()
}

/// One line of XML doc text ending in a full stop.
fn doc_sentence(text: &str) -> String {
    let mut s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    s = s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    if !s.ends_with(['.', '!', '?']) {
        s.push('.');
    }
    s
}
