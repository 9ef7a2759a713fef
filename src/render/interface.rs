//! Interface renderer: public header, friend header and dispatch implementation.
//!
//! For an interface `I` the three files cooperate as follows:
//!
//! - `I_gen.h` exposes the opaque `I_handle` and one `I_<fn>` wrapper per function.
//! - `I_friend_gen.h` reveals `I_st` (what the handle points to), the
//!   function-pointer types and `I_vtable_st`, for implementors only.
//! - `I_gen.c` owns the private struct holding the vtable pointer, the
//!   assert-guarded dispatch wrappers and vtable inheritance.

use crate::model::{Function, Interface};
use crate::render::preamble::Preamble;
use crate::render::{include_guard, param_list, Artifact, GenConfig, Generator};

/// Headers every public interface header pulls in.
const STANDARD_INCLUDES: &[&str] = &["<stdlib.h>", "<stdbool.h>", "<stdint.h>", "<stddef.h>"];

pub struct InterfaceGenerator<'a> {
    intf: &'a Interface,
}

impl<'a> InterfaceGenerator<'a> {
    pub fn new(intf: &'a Interface) -> Self {
        Self { intf }
    }

    pub fn public_header_name(&self, config: &GenConfig) -> String {
        config.file_name(&self.intf.name, "h")
    }

    pub fn friend_header_name(&self, config: &GenConfig) -> String {
        config.file_name(&format!("{}_friend", self.intf.name), "h")
    }

    pub fn source_name(&self, config: &GenConfig) -> String {
        config.file_name(&self.intf.name, "c")
    }

    fn public_header(&self, config: &GenConfig, preamble: &Preamble<'_>) -> String {
        let n = &self.intf.name;
        let file_name = self.public_header_name(config);
        let guard = include_guard(&file_name);

        let mut out = preamble.render(&format!("This is the public interface for the {} class.", n));
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        for include in STANDARD_INCLUDES.iter().copied().chain(self.intf.includes.iter().map(String::as_str)) {
            out.push_str(&format!("#include {}\n", include));
        }
        out.push('\n');
        out.push_str("/** Opaque pointer to reference instances of this class */\n");
        out.push_str(&format!("typedef struct {n}_st_ *{n}_handle;\n\n"));
        out.push_str("/* APIs below are documented in their implementation file */\n\n");

        for func in &self.intf.functions {
            let real_name = format!("{}_{}", n, func.name);
            out.push_str(&format!("extern {}\n", func.return_type()));
            out.push_str(&format!(
                "{real_name}({n}_handle {n}_h{});\n\n",
                param_list(func.params(), real_name.len() + 1)
            ));
        }

        out.push_str("#endif\n");
        out
    }

    fn friend_header(&self, config: &GenConfig, preamble: &Preamble<'_>) -> String {
        let n = &self.intf.name;
        let guard = include_guard(&self.friend_header_name(config));

        let mut out = preamble.render(&format!(
            "This is the friend interface for the {n} class.\n\
             It should only be included by implementors of the\n\
             {n} interface."
        ));
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        out.push_str(&format!("#include \"{}\"\n\n", self.public_header_name(config)));
        out.push_str(&format!(
            "/** Opaque pointer to reference private data for the class */\n\
             typedef struct {n}_private_st_ *{n}_private_handle;\n\n\
             /** Friend accessible data for this class */\n\
             typedef struct {n}_st_ {{\n\
             \x20   /** Reference to private data */\n\
             \x20   {n}_private_handle private_h;\n\
             }} {n}_st;\n\n"
        ));

        for func in &self.intf.functions {
            let real_name = format!("(*{}_{}_fn)", n, func.name);
            out.push_str("/**\n * Virtual function declaration.\n */\n");
            out.push_str(&format!("typedef {}\n", func.return_type()));
            out.push_str(&format!(
                "{real_name}({n}_handle {n}_h{});\n\n",
                param_list(func.params(), real_name.len() + 1)
            ));
        }

        out.push_str(&format!(
            "/**\n\
             \x20* The virtual table to be specified by friend classes.\n\
             \x20*\n\
             \x20* @see {n}_set_vtable()\n\
             \x20*/\n\
             typedef struct {n}_vtable_st_ {{\n"
        ));
        for func in &self.intf.functions {
            out.push_str(&format!(
                "    /** Virtual function */\n    {n}_{f}_fn {f}_fn;\n",
                f = func.name
            ));
        }
        out.push_str(&format!("}} {n}_vtable_st;\n\n"));

        let set_vtable = format!("{n}_set_vtable");
        out.push_str("/* APIs below are documented in their implementation file */\n\n");
        out.push_str(&format!(
            "extern bool\n\
             {set_vtable}({n}_handle {n}_h,\n\
             {pad}{n}_vtable_st *vtable);\n\n\
             extern void\n\
             {n}_friend_delete({n}_handle {n}_h);\n\n\
             extern bool\n\
             {n}_init({n}_handle {n}_h);\n\n\
             #endif\n",
            pad = " ".repeat(set_vtable.len() + 1)
        ));
        out
    }

    fn source(&self, config: &GenConfig, preamble: &Preamble<'_>) -> String {
        let n = &self.intf.name;

        let mut out = preamble.render(&format!("This is the implementation of the {n} interface."));
        out.push_str("#include <assert.h>\n");
        out.push_str(&format!("#include \"{}\"\n\n", self.friend_header_name(config)));

        out.push_str(&format!(
            r#"/**
 * Private variables which cannot be directly accessed by
 * any other class including children.
 */
typedef struct {n}_private_st_ {{
    /** Virtual function table */
    const {n}_vtable_st *vtable;
}} {n}_private_st;

/**
 * The internal function to delete a {n} object.  Upon return, the
 * object is no longer valid.
 *
 * @param {n}_h The object.  If NULL, then this function is a no-op.
 * @param free_{n}_h Indicates whether the base object should be freed
 * or not.
 * @see {n}_delete()
 * @see {n}_friend_delete()
 */
static void
{n}_delete_internal ({n}_handle {n}_h,
    bool free_{n}_h)
{{
    if (NULL == {n}_h) {{
        return;
    }}

    if (NULL != {n}_h->private_h) {{
        free({n}_h->private_h);
        {n}_h->private_h = NULL;
    }}

    if (free_{n}_h) {{
        free({n}_h);
    }}
}}

/**
 * Allow a friend class to delete the {n} object.  It is assumed that
 * the friend class is managing the memory for the {n} object and, thus,
 * the object will not be freed.  However, members within the {n} object
 * may be freed.  This does not call the virtual function table version of
 * delete, but rather the delete specifically for type {n}.
 *
 * @param {n}_h The object.  If NULL, then this function is a no-op.
 * @see {n}_delete()
 */
void
{n}_friend_delete ({n}_handle {n}_h)
{{
    {n}_delete_internal({n}_h, false);
}}

"#
        ));

        for func in &self.intf.functions {
            out.push_str(&self.dispatch_wrapper(func));
        }

        out.push_str(&self.default_vtable());
        out.push_str(&self.inherit_vtable());

        out.push_str(&format!(
            r#"/**
 * This is a function used by implementing classes to set the virtual table
 * according with their methods.
 *
 * @param {n}_h The object
 * @param vtable The virtual table specification for the implementing class.  If
 * any function pointer is NULL, an error is returned.
 * @return TRUE on success, FALSE otherwise
 */
bool
{n}_set_vtable ({n}_handle {n}_h,
    {n}_vtable_st *vtable)
{{
    bool rc;

    if ((NULL == {n}_h) || (NULL == vtable) ||
        (NULL == {n}_h->private_h)) {{
        return (false);
    }}

    rc = {n}_inherit_vtable(&{n}_vtable, vtable, true);

    if (rc) {{
        {n}_h->private_h->vtable = vtable;
    }}

    return (rc);
}}

/**
 * Allows a friend class to initialize their inner {n} object.  Must be
 * called before the {n} object is used.  If an error is returned, any
 * clean-up was handled internally and there is no need to call a delete
 * function.
 *
 * @param {n}_h The object
 * @return TRUE on success, FALSE otherwise
 * @see {n}_delete()
 * @see {n}_friend_delete()
 */
bool
{n}_init ({n}_handle {n}_h)
{{
    if (NULL == {n}_h) {{
        return (false);
    }}

    {n}_h->private_h = calloc(1, sizeof(*{n}_h->private_h));
    if (NULL == {n}_h->private_h) {{
        goto err_exit;
    }}

    {n}_h->private_h->vtable = NULL;

    return (true);

err_exit:

    if (NULL != {n}_h->private_h) {{
        free({n}_h->private_h);
        {n}_h->private_h = NULL;
    }}

    return (false);
}}
"#
        ));
        out
    }

    /// `I_<fn>`: check every link of the dispatch chain, then forward.
    fn dispatch_wrapper(&self, func: &Function) -> String {
        let n = &self.intf.name;
        let f = &func.name;
        let real_name = format!("{n}_{f}");

        let mut out = format!("/**\n * {f} from {n}.\n *\n * @param {n}_h The object\n");
        for param in func.params() {
            out.push_str(&format!(" * @param {} Input parameter\n", param.identifier));
        }
        if !func.returns_void() {
            out.push_str(&format!(" * @return {}\n", func.return_type()));
        }
        out.push_str(" */\n");

        out.push_str(&format!(
            "{}\n{real_name} ({n}_handle {n}_h{})\n{{\n",
            func.return_type(),
            param_list(func.params(), real_name.len() + 2)
        ));
        out.push_str(&format!(
            "    assert((NULL != {n}_h) &&\n\
             \x20          (NULL != {n}_h->private_h) &&\n\
             \x20          (NULL != {n}_h->private_h->vtable) &&\n\
             \x20          (NULL != {n}_h->private_h->vtable->{f}_fn));\n\n"
        ));

        let args: String = func
            .params()
            .map(|p| format!(", {}", p.identifier))
            .collect();
        let call = format!("{n}_h->private_h->vtable->{f}_fn({n}_h{args})");
        if func.returns_void() {
            out.push_str(&format!("    {call};\n"));
        } else {
            out.push_str(&format!("    return ({call});\n"));
        }
        out.push_str("}\n\n");
        out
    }

    /// The interface's own table: abstract, so every slot is NULL.
    fn default_vtable(&self) -> String {
        let n = &self.intf.name;
        let slots: Vec<String> = self
            .intf
            .functions
            .iter()
            .map(|func| format!("    .{}_fn = NULL", func.name))
            .collect();

        format!(
            "/**\n\
             \x20* The virtual function table used for objects of type {n}.  As this is\n\
             \x20* an interface, all functions should be NULL.\n\
             \x20*/\n\
             static const {n}_vtable_st {n}_vtable = {{\n\
             {}\n\
             }};\n\n",
            slots.join(",\n")
        )
    }

    /// `I_inherit_vtable`: copy parent slots into NULL child slots.
    fn inherit_vtable(&self) -> String {
        let n = &self.intf.name;
        let mut out = format!(
            r#"/**
 * Fill in the child vtable with values inherited from the parent_vtable for all
 * functions left NULL in the child vtable.
 *
 * @param parent_vtable The parent vtable from which to inherit.
 * @param child_vtable The child vtable to which functions may be inherited.
 * @param do_null_check Indicates whether an error should be thrown if a
 * function in the child vtable is NULL after inheritance.
 * @return TRUE on success, FALSE otherwise
 */
static bool
{n}_inherit_vtable (const {n}_vtable_st *parent_vtable,
    {n}_vtable_st *child_vtable,
    bool do_null_check)
{{
    if ((NULL == parent_vtable) || (NULL == child_vtable)) {{
        return (false);
    }}

"#
        );

        for func in &self.intf.functions {
            out.push_str(&format!(
                r#"    if (NULL == child_vtable->{f}_fn) {{
        child_vtable->{f}_fn = parent_vtable->{f}_fn;
        if (do_null_check && (NULL == child_vtable->{f}_fn)) {{
            return (false);
        }}
    }}

"#,
                f = func.name
            ));
        }

        out.push_str("    return (true);\n}\n\n");
        out
    }
}

impl Generator for InterfaceGenerator<'_> {
    fn artifacts(&self, config: &GenConfig, preamble: &Preamble<'_>) -> Vec<Artifact> {
        vec![
            Artifact {
                file_name: self.public_header_name(config),
                contents: self.public_header(config, preamble),
            },
            Artifact {
                file_name: self.friend_header_name(config),
                contents: self.friend_header(config, preamble),
            },
            Artifact {
                file_name: self.source_name(config),
                contents: self.source(config, preamble),
            },
        ]
    }
}
