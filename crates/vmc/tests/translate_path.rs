//! End-to-end tests exercising `translate_path` against real files on disk.

use std::fs;

#[test]
fn translates_single_file_to_sibling_asm() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Foo.vm");
    fs::write(&src, "push constant 7\npush constant 8\nadd\n").unwrap();

    let out = vmc::translate_path(&src).unwrap();
    assert_eq!(out, dir.path().join("Foo.asm"));

    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.starts_with("\t@256\n\tD=A\n\t@SP\n\tM=D\n"));
    assert!(asm.contains("D=D+M"));
}

#[test]
fn translates_every_vm_file_in_a_directory_to_one_asm() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Main.vm"), "function Main.main 0\ncall Sys.halt 0\n").unwrap();
    fs::write(dir.path().join("Sys.vm"), "function Sys.halt 0\nreturn\n").unwrap();

    let out = vmc::translate_path(dir.path()).unwrap();
    let dir_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(out.file_name().unwrap().to_string_lossy(), format!("{dir_name}.asm"));

    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.contains("(Main.main)"));
    assert!(asm.contains("(Sys.halt)"));
}

#[test]
fn directory_with_no_vm_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    assert!(vmc::translate_path(dir.path()).is_err());
}

#[test]
fn bootstrap_is_present_with_no_real_program_commands() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Empty.vm");
    fs::write(&src, "").unwrap();

    let out = vmc::translate_path(&src).unwrap();
    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.contains("@SP"));
    assert!(asm.contains("Sys.init$ret.0"));
}
