use anyhow::Result;

fn main() -> Result<()> {
    let mut book = umya_spreadsheet::new_file();

    let sheet = book.get_active_sheet_mut();

    // Project details, column C.
    let details: [(&str, &str); 8] = [
        ("C1", "Marina Heights"),
        ("C2", "A-1204"),
        ("C3", "2 Bedroom"),
        ("C4", "Type B"),
        ("C5", "Sea View"),
        ("C6", "1,050 sq ft"),
        ("C7", "180 sq ft"),
        ("C8", "1,230 sq ft"),
    ];
    for (addr, value) in details {
        sheet.get_cell_mut(addr).set_value(value);
    }
    sheet.get_cell_mut("C9").set_value_number(1_500_000);
    sheet.get_cell_mut("C10").set_value_number(1_650_000);

    // Initial payments: caption in E, value in G.
    let payments: [(u32, &str, f64); 6] = [
        (2, "Refund (30% of Original Price)", 0.3),
        (3, "Balance Resale Clause", 150_000.0),
        (4, "Premium", 25_000.0),
        (5, "Admin Fees (SAAS)", 0.02),
        (6, "ADGM (2% of Selling Price)", 0.02),
        (7, "Agency Fees", 0.02),
    ];
    for (row, caption, value) in payments {
        sheet.get_cell_mut(format!("E{row}").as_str()).set_value(caption);
        sheet.get_cell_mut(format!("G{row}").as_str()).set_value_number(value);
    }

    // Payment plan with the percentages stored as fractions, the way the
    // offer template was first filled in.
    let plan: [(u32, &str, f64, f64); 4] = [
        (4, "On booking", 0.1, 165_000.0),
        (5, "On SPA signing", 0.1, 165_000.0),
        (6, "50% construction", 0.1, 165_000.0),
        (7, "On handover", 0.7, 1_155_000.0),
    ];
    for (row, milestone, percent, amount) in plan {
        sheet.get_cell_mut(format!("J{row}").as_str()).set_value(milestone);
        sheet.get_cell_mut(format!("K{row}").as_str()).set_value_number(percent);
        sheet.get_cell_mut(format!("L{row}").as_str()).set_value_number(amount);
    }

    umya_spreadsheet::writer::xlsx::write(&book, "Book1.xlsx")?;
    println!("Wrote Book1.xlsx");
    Ok(())
}
