use gridedit_core::{
    ColumnScope, GridStore, IncludedColumns, ReplaceOptions, SearchEngine, SearchOptions,
    SearchStatus,
};

fn main() {
    // Uploaded rows; column 2 is not mapped
    let store = GridStore::from_values(vec![
        vec!["John Doe", "john@x.com", "internal"],
        vec!["Jane doe", "JANE@X.COM", "Doe"],
        vec!["Doehnt", "bad-email", "n/a"],
    ]);
    let included = IncludedColumns::new(vec![0, 1]);

    println!("=== Example 1: Case-insensitive substring 'doe' ===");
    print_find(&store, &included, &SearchOptions::new("doe"));

    println!("\n=== Example 2: Whole word 'Doe' ===");
    print_find(&store, &included, &SearchOptions::new("Doe").whole_word(true));

    println!("\n=== Example 3: Regex on the email column ===");
    let options = SearchOptions::new(r"^[^@]+$")
        .regex(true)
        .scope(ColumnScope::Single(1));
    print_find(&store, &included, &options);

    println!("\n=== Example 4: Invalid regex ===");
    print_find(&store, &included, &SearchOptions::new("[").regex(true));

    println!("\n=== Example 5: Replace with captures ===");
    let options = ReplaceOptions::new(
        SearchOptions::new(r"(\w+)@x\.com").regex(true),
        "$1@example.com",
    );
    match SearchEngine::replace_all(&store, &included, &options) {
        Ok(changes) => {
            println!("{} cells would change:", changes.len());
            for change in &changes {
                println!(
                    "  - ({}, {}): '{}' -> '{}'",
                    change.row, change.col, change.old_value, change.new_value
                );
            }
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn print_find(store: &GridStore, included: &IncludedColumns, options: &SearchOptions) {
    let result = SearchEngine::find(store, included, options);
    match SearchStatus::from_result(&result) {
        SearchStatus::Matches(n) => println!("Found {} matches:", n),
        SearchStatus::NoMatches => println!("No matches"),
        SearchStatus::InvalidPattern(msg) => println!("Bad pattern: {}", msg),
    }
    for pos in result.unwrap_or_default() {
        println!(
            "  - Cell {}:{} -> '{}'",
            pos.row,
            pos.col,
            store.value_at(pos.row, pos.col)
        );
    }
}
