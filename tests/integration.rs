use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_c-intf-gen")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

fn listing(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// -- generation --

#[test]
fn generates_interface_and_class_files() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("abs_factory.def"))
        .assert()
        .success();

    assert_eq!(
        listing(&dir),
        vec![
            "button_friend_gen.h",
            "button_gen.c",
            "button_gen.h",
            "gui_factory_friend_gen.h",
            "gui_factory_gen.c",
            "gui_factory_gen.h",
            "win_button_gen.c",
            "win_button_gen.h",
            "win_factory_gen.c",
            "win_factory_gen.h",
        ]
    );
}

#[test]
fn interface_header_content() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("abs_factory.def"))
        .assert()
        .success();

    let header = read(&dir, "gui_factory_gen.h");
    assert!(header.starts_with("/* THIS IS A GENERATED FILE, DO NOT EDIT!!! */\n"));
    assert!(header.contains(" * @author John Doe <john@doe.com>\n"));
    assert!(header.contains(" * This file is part of the GUI demo.\n"));
    assert!(header.contains("#ifndef __GUI_FACTORY_GEN_H__\n"));
    assert!(header.contains("#include \"button_gen.h\"\n"));
    assert!(header.contains("typedef struct gui_factory_st_ *gui_factory_handle;\n"));
    assert!(header.contains("extern button_handle\ngui_factory_create_button(gui_factory_handle gui_factory_h"));
    assert!(header.contains("const char *label);"));
    assert!(header.contains("extern void\ngui_factory_delete(gui_factory_handle gui_factory_h);"));

    let friend = read(&dir, "gui_factory_friend_gen.h");
    assert!(friend.contains("#include \"gui_factory_gen.h\"\n"));
    assert!(friend.contains("gui_factory_set_vtable(gui_factory_handle gui_factory_h,"));

    let source = read(&dir, "gui_factory_gen.c");
    assert!(source.contains("#include \"gui_factory_friend_gen.h\"\n"));
    assert!(source.contains("gui_factory_inherit_vtable"));
}

#[test]
fn class_files_embed_interfaces() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("abs_factory.def"))
        .assert()
        .success();

    let header = read(&dir, "win_button_gen.h");
    assert!(header.contains("#include \"button_gen.h\"\n"));
    assert!(header.contains("extern button_handle\nwin_button_cast_to_button(win_button_handle win_button_h);"));

    let source = read(&dir, "win_button_gen.c");
    assert!(source.contains("#include \"win_button_gen.h\"\n#include \"button_friend_gen.h\"\n"));
    assert!(source.contains("    button_st button;\n"));
    assert!(source.contains("offsetof(win_button_st, button)"));
    assert!(source.contains("static button_vtable_st win_button_button_vtable = {"));
    assert!(!source.contains("gui_factory"));
}

#[test]
fn custom_suffix() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-s", "_auto"])
        .arg(fixture_path("continuation.def"))
        .assert()
        .success();

    assert_eq!(
        listing(&dir),
        vec!["shape_auto.c", "shape_auto.h", "shape_friend_auto.h"]
    );
    let friend = read(&dir, "shape_friend_auto.h");
    assert!(friend.contains("#ifndef __SHAPE_FRIEND_AUTO_H__\n"));
    assert!(friend.contains("#include \"shape_auto.h\"\n"));
}

#[test]
fn output_dir_is_created() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested").join("gen");

    cmd()
        .args(["--output-dir", out.to_str().unwrap()])
        .arg(fixture_path("continuation.def"))
        .assert()
        .success();

    assert!(out.join("shape_gen.h").exists());
}

#[test]
fn continuation_lines_are_joined() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("continuation.def"))
        .assert()
        .success();

    let header = read(&dir, "shape_gen.h");
    assert!(header.contains("int32_t dx,"));
    assert!(header.contains("int32_t dy);"));
}

// -- failures --

#[test]
fn unknown_statement_reports_line() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("unknown_statement.def"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 4: unknown format"))
        .stderr(predicate::str::contains("OUTPUT double result"));

    assert!(listing(&dir).is_empty());
}

#[test]
fn undefined_interface_is_named() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("employee.def"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-existent interfaces specified: employee"));

    assert!(listing(&dir).is_empty());
}

#[test]
fn missing_description_file() {
    cmd()
        .arg("/nonexistent/shapes.def")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open /nonexistent/shapes.def"));
}

#[test]
fn help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--gen-file-suffix"));
}

#[test]
fn class_sharing_interface_name_is_rejected() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("shared_name.def"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 7: interface and class `button` would generate the same files"));

    assert!(listing(&dir).is_empty());
}

// -- generated C --

fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn generated_class_compiles_and_dispatches() {
    if !have_cc() {
        eprintln!("skipping: no C compiler on PATH");
        return;
    }
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("shapes.def"))
        .assert()
        .success();
    fs::copy(fixture_path("square_main.c"), dir.path().join("square_main.c")).unwrap();

    let exe = dir.path().join("square");
    let status = Command::new("cc")
        .current_dir(dir.path())
        .args(["-std=c99", "-Wall", "-Werror", "-o"])
        .arg(&exe)
        .args(["square_main.c", "shape_gen.c", "named_gen.c"])
        .status()
        .unwrap();
    assert!(status.success(), "generated C failed to compile");

    // Casts round-trip, dispatch reaches the class, incomplete vtables are refused
    let run = Command::new(&exe).status().unwrap();
    assert_eq!(run.code(), Some(0));
}
