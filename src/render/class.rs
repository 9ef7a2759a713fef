//! Class renderer: header with casts, and the interface glue implementation.
//!
//! A class embeds one `I_st` per implemented interface by value. The struct
//! members, the `offsetof` upcasts, the downcasts, init and delete are all
//! rendered from the same [`EmbeddedField`] list so the layout and the cast
//! arithmetic cannot drift apart.

use crate::model::Interface;
use crate::parser::ResolvedClass;
use crate::render::interface::InterfaceGenerator;
use crate::render::preamble::Preamble;
use crate::render::{include_guard, param_list, Artifact, GenConfig, Generator};

/// One interface sub-struct inside the class struct.
struct EmbeddedField<'a> {
    intf: &'a Interface,
    /// Member name inside `C_st`
    member: &'a str,
}

pub struct ClassGenerator<'a> {
    class: &'a ResolvedClass<'a>,
}

impl<'a> ClassGenerator<'a> {
    pub fn new(class: &'a ResolvedClass<'a>) -> Self {
        Self { class }
    }

    pub fn header_name(&self, config: &GenConfig) -> String {
        config.file_name(self.class.name, "h")
    }

    pub fn source_name(&self, config: &GenConfig) -> String {
        config.file_name(self.class.name, "c")
    }

    /// Embedded interfaces in declaration order.
    fn fields(&self) -> Vec<EmbeddedField<'a>> {
        self.class
            .interfaces
            .iter()
            .copied()
            .map(|intf| EmbeddedField {
                intf,
                member: intf.name.as_str(),
            })
            .collect()
    }

    fn header(&self, config: &GenConfig, preamble: &Preamble<'_>) -> String {
        let c = self.class.name;
        let guard = include_guard(&self.header_name(config));

        let mut out = preamble.render(&format!(
            "This includes the APIs for casting to interfaces the\n\
             {c} class implements and its opaque handle.\n\
             This file should be included in the\n\
             public header file for the {c} class."
        ));
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        for field in self.fields() {
            let public = InterfaceGenerator::new(field.intf).public_header_name(config);
            out.push_str(&format!("#include \"{}\"\n", public));
        }
        out.push('\n');

        out.push_str(&format!(
            "/** Opaque pointer to reference instances of this class */\n\
             typedef struct {c}_st_ *{c}_handle;\n\n\
             /* APIs below are documented in their implementation file */\n\n\
             extern void\n\
             {c}_delete({c}_handle {c}_h);\n\n"
        ));
        for field in self.fields() {
            out.push_str(&format!(
                "extern {i}_handle\n{c}_cast_to_{i}({c}_handle {c}_h);\n\n",
                i = field.intf.name
            ));
        }

        out.push_str("#endif\n");
        out
    }

    fn source(&self, config: &GenConfig, preamble: &Preamble<'_>) -> String {
        let c = self.class.name;
        let fields = self.fields();

        let mut out = preamble.render(&format!(
            "This implements the interface related portion of the\n\
             {c} class.\n\
             This file should be included in the {c} implementation file.\n\
             Yes, including a C file is bizarre, but that's how it works here."
        ));
        out.push_str(
            "\n/*\n\
             \x20* See below for forward declarations that must be defined manually in the\n\
             \x20* implementing C file.\n\
             \x20*/\n\n",
        );

        out.push_str(&format!("#include \"{}\"\n", self.header_name(config)));
        for field in &fields {
            let friend = InterfaceGenerator::new(field.intf).friend_header_name(config);
            out.push_str(&format!("#include \"{}\"\n", friend));
        }
        out.push('\n');

        out.push_str(&self.obligations(&fields));
        out.push_str(&self.struct_definition(&fields));

        out.push_str("/*\n * This is C, we need explicit casts to each of an object's parent classes.\n */\n\n");
        for field in &fields {
            out.push_str(&self.casts(field));
        }

        out.push_str(&self.delete(&fields));
        for field in &fields {
            out.push_str(&self.delete_trampoline(field));
        }
        for field in &fields {
            out.push_str(&self.vtable(field));
        }
        out.push_str(&self.init(&fields));
        out
    }

    /// Forward declarations the class author implements by hand.
    fn obligations(&self, fields: &[EmbeddedField<'_>]) -> String {
        let c = self.class.name;
        let mut out = format!(
            r#"/* Forward declarations */
/* Begin structs that must be defined manually. */

/**
 * Forward pointer to reference non-interface data for the class.
 * This must be defined manually.
 */
typedef struct {c}_data_st_ *{c}_data_handle;

/* End structs that must be defined manually. */

/* Forward declarations */
/* Begin functions that must be defined manually. */

static void
{c}_data_delete({c}_data_handle *{c}_data_h);

static bool
{c}_data_create({c}_data_handle *{c}_data_h, void *context);

"#
        );

        for field in fields {
            let i = &field.intf.name;
            for func in field.intf.functions.iter().filter(|f| !f.is_destructor()) {
                out.push_str(&format!(
                    "static {}\n{c}_{i}_{}({i}_handle {i}_h{});\n\n",
                    func.return_type(),
                    func.name,
                    param_list(func.params(), 4)
                ));
            }
        }

        out.push_str("/* End functions that must be defined manually. */\n\n");
        out
    }

    fn struct_definition(&self, fields: &[EmbeddedField<'_>]) -> String {
        let c = self.class.name;
        let mut out = format!("/** Private data for this class */\ntypedef struct {c}_st_ {{\n");
        for field in fields {
            out.push_str(&format!(
                "    /** {i} reference */\n    {i}_st {m};\n",
                i = field.intf.name,
                m = field.member
            ));
        }
        out.push_str(&format!(
            "    /** Data for this class */\n    {c}_data_handle {c}_data_h;\n}} {c}_st;\n\n"
        ));
        out
    }

    /// Upcast by `offsetof` of the embedded member, downcast by its address.
    fn casts(&self, field: &EmbeddedField<'_>) -> String {
        let c = self.class.name;
        let i = &field.intf.name;
        let m = field.member;
        format!(
            r#"/**
 * Cast the {i} object to {c}.
 *
 * @param {i}_h The {i} object
 * @return The {c} object
 */
static {c}_handle
{i}_cast_to_{c} ({i}_handle {i}_h)
{{
    {c}_handle {c}_h = NULL;

    if (NULL != {i}_h) {{
        {c}_h = ({c}_handle) ((uint8_t *) {i}_h -
            offsetof({c}_st, {m}));
    }}

    return ({c}_h);
}}

/**
 * Cast the {c} object to {i}.
 *
 * @param {c}_h The {c} object
 * @return The {i} object
 */
{i}_handle
{c}_cast_to_{i} ({c}_handle {c}_h)
{{
    {i}_handle {i}_h = NULL;

    if (NULL != {c}_h) {{
        {i}_h = &({c}_h->{m});
    }}

    return ({i}_h);
}}

"#
        )
    }

    /// Class data first, then each embedded interface, then the object.
    fn delete(&self, fields: &[EmbeddedField<'_>]) -> String {
        let c = self.class.name;
        let mut out = format!(
            r#"/**
 * The function to delete a {c} object.  Upon return, the
 * object is no longer valid.
 *
 * @param {c}_h The object.  If NULL, then this function is a no-op.
 */
void
{c}_delete ({c}_handle {c}_h)
{{
    if (NULL == {c}_h) {{
        return;
    }}

    {c}_data_delete(&({c}_h->{c}_data_h));

"#
        );
        for field in fields {
            out.push_str(&format!(
                "    {i}_friend_delete(&({c}_h->{m}));\n\n",
                i = field.intf.name,
                m = field.member
            ));
        }
        out.push_str(&format!("    free({c}_h);\n}}\n\n"));
        out
    }

    /// The `delete` slot of each interface routes back to the class delete.
    fn delete_trampoline(&self, field: &EmbeddedField<'_>) -> String {
        let c = self.class.name;
        let i = &field.intf.name;
        format!(
            r#"/**
 * Wrapper to call the common delete function.
 *
 * @param {i}_h The object
 */
static void
{c}_{i}_delete ({i}_handle {i}_h)
{{
    if (NULL == {i}_h) {{
        return;
    }}

    {c}_delete({i}_cast_to_{c}({i}_h));
}}

"#
        )
    }

    /// Fully populated table for one interface, owned by this class.
    fn vtable(&self, field: &EmbeddedField<'_>) -> String {
        let c = self.class.name;
        let i = &field.intf.name;
        let slots: Vec<String> = field
            .intf
            .functions
            .iter()
            .map(|func| format!("    .{f}_fn = {c}_{i}_{f}", f = func.name))
            .collect();
        format!(
            "/**\n * The virtual function table for the {i} interface of {c}.\n */\n\
             static {i}_vtable_st {c}_{i}_vtable = {{\n{}\n}};\n\n",
            slots.join(",\n")
        )
    }

    /// `C_init`: init and attach each interface, then class data; unwind on failure.
    fn init(&self, fields: &[EmbeddedField<'_>]) -> String {
        let c = self.class.name;
        let mut out = format!(
            r#"/**
 * Initialize the {c} objects.
 *
 * @param {c}_h The object
 * @param context An opaque context passed to {c}_data_create
 * @return TRUE on success, FALSE otherwise
 */
static bool
{c}_init ({c}_handle {c}_h, void *context)
{{
    bool rc = false;
"#
        );
        for field in fields {
            out.push_str(&format!("    bool {}_initialized = false;\n", field.member));
        }
        out.push_str(&format!(
            "    bool {c}_data_created = false;\n\n    if (NULL == {c}_h) {{\n        return (false);\n    }}\n\n"
        ));

        for field in fields {
            let i = &field.intf.name;
            let m = field.member;
            out.push_str(&format!(
                r#"    rc = {i}_init(&({c}_h->{m}));
    if (!rc) {{
        goto err_exit;
    }}
    {m}_initialized = true;

    rc = {i}_set_vtable(&({c}_h->{m}),
             &{c}_{i}_vtable);
    if (!rc) {{
        goto err_exit;
    }}

"#
            ));
        }

        out.push_str(&format!(
            r#"    rc = {c}_data_create(&({c}_h->{c}_data_h), context);
    if (!rc) {{
        goto err_exit;
    }}
    {c}_data_created = true;

    return (true);

err_exit:

    if ({c}_data_created) {{
        {c}_data_delete(&({c}_h->{c}_data_h));
    }}

"#
        ));

        for field in fields.iter().rev() {
            out.push_str(&format!(
                "    if ({m}_initialized) {{\n        {i}_friend_delete(&({c}_h->{m}));\n    }}\n\n",
                i = field.intf.name,
                m = field.member
            ));
        }

        out.push_str("    return (false);\n}\n");
        out
    }
}

impl Generator for ClassGenerator<'_> {
    fn artifacts(&self, config: &GenConfig, preamble: &Preamble<'_>) -> Vec<Artifact> {
        vec![
            Artifact {
                file_name: self.header_name(config),
                contents: self.header(config, preamble),
            },
            Artifact {
                file_name: self.source_name(config),
                contents: self.source(config, preamble),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, resolve};

    const FACTORY: &str = r#"INTERFACE button
    FUNCTION paint
        RETURN void
    END FUNCTION
END INTERFACE

INTERFACE widget
    FUNCTION resize
        RETURN bool
        INPUT uint32_t width
        INPUT uint32_t height
    END FUNCTION
END INTERFACE

CLASS win_button
    IMPLEMENTS button
    END IMPLEMENTS
    IMPLEMENTS widget
    END IMPLEMENTS
END CLASS

CLASS osx_button
    IMPLEMENTS button
    END IMPLEMENTS
END CLASS
"#;

    fn render_all(input: &str) -> Vec<Vec<Artifact>> {
        let doc = parse(input).unwrap();
        let classes = resolve(&doc).unwrap();
        let preamble = Preamble::new(None, None);
        classes
            .iter()
            .map(|class| ClassGenerator::new(class).artifacts(&GenConfig::default(), &preamble))
            .collect()
    }

    fn win_button() -> (String, String) {
        let mut all = render_all(FACTORY);
        let mut files = all.remove(0);
        let source = files.remove(1).contents;
        let header = files.remove(0).contents;
        (header, source)
    }

    #[test]
    fn two_files_per_class() {
        let all = render_all(FACTORY);
        let names: Vec<&str> = all[0].iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["win_button_gen.h", "win_button_gen.c"]);
    }

    #[test]
    fn header_declares_delete_and_casts() {
        let (header, _) = win_button();
        assert!(header.contains("#include \"button_gen.h\"\n#include \"widget_gen.h\"\n"));
        assert!(header.contains("typedef struct win_button_st_ *win_button_handle;"));
        assert!(header.contains("extern void\nwin_button_delete(win_button_handle win_button_h);"));
        assert!(header.contains("extern button_handle\nwin_button_cast_to_button(win_button_handle win_button_h);"));
        assert!(header.contains("extern widget_handle\nwin_button_cast_to_widget(win_button_handle win_button_h);"));
    }

    #[test]
    fn struct_embeds_interfaces_in_declaration_order() {
        let (_, source) = win_button();
        assert!(source.contains(
            "typedef struct win_button_st_ {\n\
             \x20   /** button reference */\n\
             \x20   button_st button;\n\
             \x20   /** widget reference */\n\
             \x20   widget_st widget;\n\
             \x20   /** Data for this class */\n\
             \x20   win_button_data_handle win_button_data_h;\n\
             } win_button_st;\n"
        ));
    }

    #[test]
    fn casts_use_the_embedded_member() {
        let (_, source) = win_button();
        for member in ["button", "widget"] {
            assert!(source.contains(&format!("    {member}_st {member};\n")));
            assert!(source.contains(&format!("offsetof(win_button_st, {member})")));
            assert!(source.contains(&format!("{member}_h = &(win_button_h->{member});")));
        }
    }

    #[test]
    fn trampolines_are_obligations_except_delete() {
        let (_, source) = win_button();
        assert!(source.contains("static void\nwin_button_button_paint(button_handle button_h);"));
        assert!(source.contains(
            "static bool\nwin_button_widget_resize(widget_handle widget_h,\n    uint32_t width,\n    uint32_t height);"
        ));
        assert!(!source.contains("win_button_button_delete(button_handle button_h);"));
        assert!(source.contains("static void\nwin_button_button_delete (button_handle button_h)\n{"));
        assert!(source.contains("static bool\nwin_button_data_create(win_button_data_handle *win_button_data_h, void *context);"));
    }

    #[test]
    fn vtables_are_fully_populated() {
        let (_, source) = win_button();
        assert!(source.contains(
            "static widget_vtable_st win_button_widget_vtable = {\n\
             \x20   .resize_fn = win_button_widget_resize,\n\
             \x20   .delete_fn = win_button_widget_delete\n\
             };\n"
        ));
        assert!(!source.contains("= NULL\n"));
    }

    #[test]
    fn delete_order() {
        let (_, source) = win_button();
        let data = source.find("    win_button_data_delete(&(win_button_h->win_button_data_h));").unwrap();
        let button = source.find("    button_friend_delete(&(win_button_h->button));\n\n    widget").unwrap();
        let free = source.find("    free(win_button_h);").unwrap();
        assert!(data < button && button < free);
    }

    #[test]
    fn init_unwinds_in_reverse() {
        let (_, source) = win_button();
        let init = &source[source.find("win_button_init (").unwrap()..];
        assert!(init.contains("rc = button_set_vtable(&(win_button_h->button),\n             &win_button_button_vtable);"));

        let unwind = &init[init.find("err_exit:").unwrap()..];
        let data = unwind.find("if (win_button_data_created)").unwrap();
        let widget = unwind.find("if (widget_initialized)").unwrap();
        let button = unwind.find("if (button_initialized)").unwrap();
        assert!(data < widget && widget < button);
        assert!(unwind.ends_with("    return (false);\n}\n"));
    }

    #[test]
    fn classes_sharing_an_interface_get_their_own_tables() {
        let all = render_all(FACTORY);
        let win = &all[0][1].contents;
        let osx = &all[1][1].contents;
        assert!(win.contains("static button_vtable_st win_button_button_vtable = {\n    .paint_fn = win_button_button_paint,"));
        assert!(osx.contains("static button_vtable_st osx_button_button_vtable = {\n    .paint_fn = osx_button_button_paint,"));
        assert!(!osx.contains("win_button"));
    }
}
