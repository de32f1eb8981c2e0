#[cfg(test)]
mod tests {
    use voc2yolo::conversion::normalize_bbox;
    use voc2yolo::{
        convert, parse_annotation_str, AnnotationRecord, BoundingBox, BoxError, ClassVocabulary,
        ConfigError, Conversion, ObjectInstance, RecordError,
    };

    fn vocabulary(names: &[&str]) -> ClassVocabulary {
        ClassVocabulary::new(names.iter().copied()).unwrap()
    }

    fn object(class_name: &str, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> ObjectInstance {
        ObjectInstance {
            class_name: class_name.to_string(),
            bbox: Ok(BoundingBox {
                xmin,
                ymin,
                xmax,
                ymax,
            }),
        }
    }

    fn record(width: u32, height: u32, objects: Vec<ObjectInstance>) -> AnnotationRecord {
        AnnotationRecord {
            width,
            height,
            objects,
        }
    }

    fn voc_xml(width: &str, height: &str, objects: &[(&str, [&str; 4])]) -> String {
        let mut xml = format!(
            "<annotation>\n  <folder>Images</folder>\n  <filename>img.jpg</filename>\n  \
             <size>\n    <width>{}</width>\n    <height>{}</height>\n    <depth>3</depth>\n  </size>\n  \
             <segmented>0</segmented>\n",
            width, height
        );
        for (name, [xmin, ymin, xmax, ymax]) in objects {
            xml.push_str(&format!(
                "  <object>\n    <name>{}</name>\n    <pose>Unspecified</pose>\n    \
                 <truncated>0</truncated>\n    <difficult>0</difficult>\n    <bndbox>\n      \
                 <xmin>{}</xmin>\n      <ymin>{}</ymin>\n      <xmax>{}</xmax>\n      \
                 <ymax>{}</ymax>\n    </bndbox>\n  </object>\n",
                name, xmin, ymin, xmax, ymax
            ));
        }
        xml.push_str("</annotation>\n");
        xml
    }

    fn convert_xml(xml: &str, vocab: &ClassVocabulary) -> Result<Conversion, RecordError> {
        convert(&parse_annotation_str(xml)?, vocab)
    }

    #[test]
    fn test_convert_dog_scenario() {
        let vocab = vocabulary(&["Cow", "Dog"]);
        let record = record(100, 200, vec![object("Dog", 10.0, 20.0, 50.0, 60.0)]);

        let conversion = convert(&record, &vocab).unwrap();

        assert_eq!(conversion.to_label_text(), "1 0.3 0.2 0.4 0.2");
        assert!(conversion.dropped.is_empty());
    }

    #[test]
    fn test_convert_preserves_order_and_count() {
        let vocab = vocabulary(&["Cow", "Dog", "Hare"]);
        let record = record(
            640,
            480,
            vec![
                object("Hare", 0.0, 0.0, 64.0, 48.0),
                object("Cow", 100.0, 100.0, 300.0, 200.0),
                object("Dog", 10.0, 10.0, 20.0, 20.0),
                object("Cow", 1.0, 2.0, 3.0, 4.0),
            ],
        );

        let conversion = convert(&record, &vocab).unwrap();
        let ids: Vec<usize> = conversion.boxes.iter().map(|b| b.class_id).collect();

        assert_eq!(ids, vec![2, 0, 1, 0]);
        assert_eq!(conversion.to_label_text().lines().count(), 4);
    }

    #[test]
    fn test_unknown_class_is_dropped_without_shifting_ids() {
        let vocab = vocabulary(&["Cow", "Dog"]);
        let record = record(
            100,
            100,
            vec![
                object("Elephant", 0.0, 0.0, 10.0, 10.0),
                object("Dog", 0.0, 0.0, 50.0, 50.0),
                object("Cow", 50.0, 50.0, 100.0, 100.0),
            ],
        );

        let conversion = convert(&record, &vocab).unwrap();

        assert_eq!(conversion.dropped, vec!["Elephant".to_string()]);
        assert_eq!(
            conversion.to_label_text(),
            "1 0.25 0.25 0.5 0.5\n0 0.75 0.75 0.5 0.5"
        );
    }

    #[test]
    fn test_only_unknown_class_gives_empty_text() {
        let vocab = vocabulary(&["Cow", "Dog"]);
        let record = record(100, 100, vec![object("Elephant", 0.0, 0.0, 10.0, 10.0)]);

        let conversion = convert(&record, &vocab).unwrap();

        assert!(conversion.boxes.is_empty());
        assert_eq!(conversion.dropped.len(), 1);
        assert_eq!(conversion.to_label_text(), "");
    }

    #[test]
    fn test_no_trailing_newline() {
        let vocab = vocabulary(&["Cow"]);
        let record = record(
            10,
            10,
            vec![
                object("Cow", 0.0, 0.0, 5.0, 5.0),
                object("Cow", 5.0, 5.0, 10.0, 10.0),
            ],
        );

        let text = convert(&record, &vocab).unwrap().to_label_text();

        assert!(!text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
    }

    #[test]
    fn test_normalized_values_stay_in_unit_range() {
        let (width, height) = (1920, 1080);
        let boxes = [
            (0.0, 0.0, 1920.0, 1080.0),
            (0.0, 0.0, 1.0, 1.0),
            (1919.0, 1079.0, 1920.0, 1080.0),
            (333.3, 17.25, 1000.5, 999.75),
        ];

        for (xmin, ymin, xmax, ymax) in boxes {
            let bbox = BoundingBox {
                xmin,
                ymin,
                xmax,
                ymax,
            };
            let normalized = normalize_bbox(0, &bbox, width, height);
            for value in [
                normalized.x_center,
                normalized.y_center,
                normalized.width,
                normalized.height,
            ] {
                assert!((0.0..=1.0).contains(&value), "{} out of range", value);
            }
        }
    }

    #[test]
    fn test_round_trip_reconstructs_corners() {
        let bbox = BoundingBox {
            xmin: 13.5,
            ymin: 7.0,
            xmax: 611.25,
            ymax: 402.0,
        };
        let normalized = normalize_bbox(4, &bbox, 640, 427);

        // re-parse the rendered line to cover the text format as well
        let line = normalized.to_string();
        let fields: Vec<f64> = line
            .split(' ')
            .skip(1)
            .map(|field| field.parse().unwrap())
            .collect();
        assert_eq!(fields, vec![
            normalized.x_center,
            normalized.y_center,
            normalized.width,
            normalized.height
        ]);

        let corners = normalized.to_corners(640, 427);
        assert!((corners.xmin - bbox.xmin).abs() < 1e-9);
        assert!((corners.ymin - bbox.ymin).abs() < 1e-9);
        assert!((corners.xmax - bbox.xmax).abs() < 1e-9);
        assert!((corners.ymax - bbox.ymax).abs() < 1e-9);
    }

    #[test]
    fn test_convert_is_deterministic() {
        let vocab = vocabulary(&["Cow", "Dog"]);
        let record = record(
            333,
            777,
            vec![
                object("Dog", 1.0, 2.0, 100.0, 200.0),
                object("Cow", 12.5, 13.5, 14.5, 15.5),
            ],
        );

        let first = convert(&record, &vocab).unwrap().to_label_text();
        let second = convert(&record, &vocab).unwrap().to_label_text();

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_vocabulary_rejects_duplicates_and_empty() {
        assert!(matches!(
            ClassVocabulary::new(["Cow", "Dog", "Cow"]),
            Err(ConfigError::DuplicateClass(name)) if name == "Cow"
        ));
        assert!(matches!(
            ClassVocabulary::new(Vec::<String>::new()),
            Err(ConfigError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_parse_voc_record() {
        let xml = voc_xml(
            "100",
            "200",
            &[("Dog", ["10", "20", "50", "60"]), ("Cow", [" 1.5 ", "2", "3", "4"])],
        );

        let record = parse_annotation_str(&xml).unwrap();

        assert_eq!(record.width, 100);
        assert_eq!(record.height, 200);
        assert_eq!(record.objects.len(), 2);
        assert_eq!(record.objects[0], object("Dog", 10.0, 20.0, 50.0, 60.0));
        assert_eq!(record.objects[1].bbox.as_ref().unwrap().xmin, 1.5);
    }

    #[test]
    fn test_parse_record_without_objects() {
        let record = parse_annotation_str(&voc_xml("640", "480", &[])).unwrap();
        assert!(record.objects.is_empty());
    }

    #[test]
    fn test_parse_missing_size() {
        let xml = "<annotation><filename>a.jpg</filename></annotation>";
        assert!(matches!(
            parse_annotation_str(xml),
            Err(RecordError::MissingSize)
        ));
    }

    #[test]
    fn test_parse_objects_separated_by_other_elements() {
        let xml = "<annotation><size><width>100</width><height>200</height></size>\
                   <object><name>Dog</name><bndbox><xmin>10</xmin><ymin>20</ymin>\
                   <xmax>50</xmax><ymax>60</ymax></bndbox></object>\
                   <segmented>0</segmented>\
                   <object><name>Cow</name><bndbox><xmin>0</xmin><ymin>0</ymin>\
                   <xmax>100</xmax><ymax>200</ymax></bndbox></object>\
                   <source><database>Unknown</database></source></annotation>";

        let record = parse_annotation_str(xml).unwrap();

        assert_eq!(record.objects.len(), 2);
        assert_eq!(record.objects[0], object("Dog", 10.0, 20.0, 50.0, 60.0));
        assert_eq!(record.objects[1], object("Cow", 0.0, 0.0, 100.0, 200.0));
        assert_eq!(
            convert(&record, &vocabulary(&["Cow", "Dog"]))
                .unwrap()
                .to_label_text(),
            "1 0.3 0.2 0.4 0.2\n0 0.5 0.5 1 1"
        );
    }

    #[test]
    fn test_parse_missing_bndbox_field() {
        let xml = "<annotation><size><width>10</width><height>10</height></size>\
                   <object><name>Dog</name><bndbox><xmin>1</xmin><ymin>1</ymin>\
                   <xmax>5</xmax></bndbox></object></annotation>";

        let record = parse_annotation_str(xml).unwrap();
        assert_eq!(
            record.objects[0].bbox,
            Err(BoxError::MissingField { field: "ymax" })
        );
        assert!(matches!(
            convert(&record, &vocabulary(&["Dog"])),
            Err(RecordError::MissingField { field: "ymax" })
        ));
    }

    #[test]
    fn test_parse_malformed_number() {
        let xml = voc_xml("100", "200", &[("Dog", ["ten", "20", "50", "60"])]);
        assert!(matches!(
            convert_xml(&xml, &vocabulary(&["Dog"])),
            Err(RecordError::MalformedNumber { field: "xmin", .. })
        ));
    }

    #[test]
    fn test_parse_missing_object_name_rejects_record() {
        let xml = "<annotation><size><width>10</width><height>10</height></size>\
                   <object><bndbox><xmin>1</xmin><ymin>1</ymin>\
                   <xmax>5</xmax><ymax>5</ymax></bndbox></object></annotation>";
        assert!(matches!(
            parse_annotation_str(xml),
            Err(RecordError::MissingField { field: "name" })
        ));
    }

    #[test]
    fn test_unknown_class_without_bndbox_is_dropped() {
        let xml = "<annotation><size><width>100</width><height>200</height></size>\
                   <object><name>Elephant</name></object>\
                   <object><name>Dog</name><bndbox><xmin>10</xmin><ymin>20</ymin>\
                   <xmax>50</xmax><ymax>60</ymax></bndbox></object></annotation>";

        let conversion = convert_xml(xml, &vocabulary(&["Cow", "Dog"])).unwrap();

        assert_eq!(conversion.to_label_text(), "1 0.3 0.2 0.4 0.2");
        assert_eq!(conversion.dropped, vec!["Elephant".to_string()]);
    }

    #[test]
    fn test_unknown_class_with_broken_box_is_dropped() {
        let vocab = vocabulary(&["Cow", "Dog"]);

        let inverted = voc_xml("100", "200", &[("Elephant", ["50", "20", "10", "60"])]);
        let conversion = convert_xml(&inverted, &vocab).unwrap();
        assert_eq!(conversion.to_label_text(), "");
        assert_eq!(conversion.dropped, vec!["Elephant".to_string()]);

        let malformed = voc_xml("100", "200", &[("Elephant", ["ten", "20", "50", "60"])]);
        let conversion = convert_xml(&malformed, &vocab).unwrap();
        assert!(conversion.boxes.is_empty());
        assert_eq!(conversion.dropped.len(), 1);
    }

    #[test]
    fn test_parse_zero_dimension() {
        let xml = voc_xml("0", "200", &[("Dog", ["10", "20", "50", "60"])]);
        assert!(matches!(
            parse_annotation_str(&xml),
            Err(RecordError::ZeroDimension {
                width: 0,
                height: 200
            })
        ));
    }

    #[test]
    fn test_parse_inverted_box() {
        let xml = voc_xml("100", "200", &[("Dog", ["50", "20", "10", "60"])]);
        assert!(matches!(
            convert_xml(&xml, &vocabulary(&["Cow", "Dog"])),
            Err(RecordError::InvalidBox { ref class_name, .. }) if class_name == "Dog"
        ));
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert!(matches!(
            parse_annotation_str("<annotation><size>"),
            Err(RecordError::Xml(_))
        ));
    }
}
