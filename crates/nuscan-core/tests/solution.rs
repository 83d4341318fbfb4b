use std::path::Path;

use nuscan_core::solution::parse_solution;

const SLN: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio Version 16
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App", "App\App.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}") = "Lib", "src\Lib\Lib.vbproj", "{22222222-2222-2222-2222-222222222222}"
EndProject
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "SolutionItems", "SolutionItems", "{33333333-3333-3333-3333-333333333333}"
EndProject
Global
EndGlobal
"#;

#[test]
fn extracts_project_entries() {
    let projects = parse_solution(SLN);
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].name, "App");
    assert_eq!(projects[0].relative_path, r"App\App.csproj");
    assert_eq!(projects[1].name, "Lib");
}

#[test]
fn skips_solution_folders() {
    let projects = parse_solution(SLN);
    assert!(!projects.iter().any(|p| p.name == "SolutionItems"));
}

#[test]
fn resolves_backslash_paths() {
    let projects = parse_solution(SLN);
    let resolved = projects[1].resolve_against(Path::new("/work/solution"));
    assert!(resolved.ends_with("src/Lib/Lib.vbproj") || resolved.ends_with(r"src\Lib\Lib.vbproj"));
}

#[test]
fn empty_solution() {
    assert!(parse_solution("Global\nEndGlobal\n").is_empty());
}
