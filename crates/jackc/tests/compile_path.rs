//! End-to-end tests exercising `compile_path` against real files on disk.

use std::fs;

#[test]
fn compiles_single_file_to_sibling_vm() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Foo.jack");
    fs::write(&src, "class Foo { method void bar() { return; } }").unwrap();

    let outputs = jackc::compile_path(&src).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0], dir.path().join("Foo.vm"));

    let vm = fs::read_to_string(&outputs[0]).unwrap();
    assert_eq!(
        vm,
        "function Foo.bar 0\npush argument 0\npop pointer 0\npush constant 0\nreturn\n"
    );
}

#[test]
fn compiles_every_jack_file_in_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("A.jack"), "class A { function void f() { return; } }").unwrap();
    fs::write(dir.path().join("B.jack"), "class B { function void g() { return; } }").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let outputs = jackc::compile_path(dir.path()).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|p| p.extension().unwrap() == "vm"));
}

#[test]
fn directory_with_no_jack_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    assert!(jackc::compile_path(dir.path()).is_err());
}

#[test]
fn empty_class_produces_empty_vm_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Empty.jack");
    fs::write(&src, "class Empty {}").unwrap();

    let outputs = jackc::compile_path(&src).unwrap();
    let vm = fs::read_to_string(&outputs[0]).unwrap();
    assert_eq!(vm, "");
}
