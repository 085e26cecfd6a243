use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/technologies.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog file before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let technologies = catalog.get("technologies").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'technologies' field\n\
             The catalog must have a top-level 'technologies' array.\n"
        );
    });

    let techs = technologies.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'technologies' must be an array\n\
             Got: {technologies}\n"
        );
    });

    let mut names = std::collections::HashSet::new();
    for (i, technology) in techs.iter().enumerate() {
        let name = technology
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");

        assert!(
            names.insert(name.to_string()),
            "\n\nCATALOG BUILD ERROR: Duplicate technology name '{name}'\n"
        );
        validate_technology(technology, name, i);
    }

    println!(
        "cargo:warning=Validated catalog: {} technologies",
        techs.len()
    );
}

fn validate_technology(technology: &serde_json::Value, name: &str, index: usize) {
    for field in ["name", "description", "file_count", "sequence", "umi", "barcode"] {
        assert!(
            technology.get(field).is_some(),
            "\n\nCATALOG BUILD ERROR: Technology '{name}' (index {index}) missing '{field}' field\n"
        );
    }

    let file_count = technology
        .get("file_count")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    assert!(
        file_count > 0,
        "\n\nCATALOG BUILD ERROR: Technology '{name}' must have file_count > 0\n"
    );

    if let Some(sequence) = technology.get("sequence") {
        validate_region(sequence, name, "sequence", file_count);
    }
    for role in ["umi", "barcode"] {
        if let Some(regions) = technology.get(role).and_then(|r| r.as_array()) {
            for region in regions {
                validate_region(region, name, role, file_count);
                assert!(
                    region.get("stop").and_then(serde_json::Value::as_u64).is_some(),
                    "\n\nCATALOG BUILD ERROR: Technology '{name}' {role} region must have a bounded 'stop'\n"
                );
            }
        }
    }
}

fn validate_region(region: &serde_json::Value, name: &str, role: &str, file_count: u64) {
    let stream = region
        .get("stream")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Technology '{name}' {role} region missing 'stream'\n")
        });
    assert!(
        stream < file_count,
        "\n\nCATALOG BUILD ERROR: Technology '{name}' {role} region stream {stream} \
         is not below file_count {file_count}\n"
    );

    let start = region
        .get("start")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    if let Some(stop) = region.get("stop").and_then(serde_json::Value::as_u64) {
        assert!(
            start <= stop,
            "\n\nCATALOG BUILD ERROR: Technology '{name}' {role} region has start {start} > stop {stop}\n"
        );
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/technologies.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
