//! Populate a small form with submitted values and print the result.

use std::io::Write;

use formfill::{Form, FormPopulationFilter, Values};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let months = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];

    // Values as they would arrive from a submitted request body.
    let mut values = Values::new();
    values.insert("name".to_string(), vec!["Arran Walker".to_string()]);
    values.insert("food".to_string(), vec!["1".to_string()]);
    values.insert("month".to_string(), vec!["3".to_string()]);

    let filter = FormPopulationFilter::new();
    filter.execute_template(
        vec![Form {
            values,
            ..Form::default()
        }],
        |out| {
            write!(
                out,
                r#"<html>
<head>
    <title>Your Information</title>
</head>
<body>
    <form action="/" method="post">
        <div class="form-group">
            <label for="name">Name</label>
            <input name="name" type="text" placeholder="John Smith">
        </div>

        <div class="form-group">
            <label>Do you like food? <input type="checkbox" name="food"></label>
        </div>

        <div class="form-group">
            <label for="month">Favourite Month</label>
            <select id="month" name="month">
"#,
            )?;
            for (index, month) in months.iter().enumerate() {
                writeln!(out, "                <option value=\"{index}\">{month}</option>")?;
            }
            write!(
                out,
                r#"            </select>
        </div>
    </form>
</body>
</html>"#,
            )
        },
        std::io::stdout().lock(),
    )?;
    Ok(())
}
