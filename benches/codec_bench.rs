//! Criterion benchmarks for the envelope codec pair.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use soapbind::documents::Document;
use soapbind::mapping::TypeTable;
use soapbind::soap::{self, DecodeMode};
use soapbind::{wsdl, TypedValue, Value};

const ORDERS_WSDL: &str = r#"<wsdl:definitions
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:orders"
    targetNamespace="urn:orders">
  <wsdl:types>
    <xs:schema>
      <xs:element name="PlaceOrder">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Reference" type="xs:string"/>
            <xs:element name="Quantity" type="xs:int"/>
            <xs:element name="Item" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
            <xs:element name="Customer" type="tns:Customer"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
      <xs:complexType name="Customer">
        <xs:sequence>
          <xs:element name="Name" type="xs:string"/>
          <xs:element name="City" type="xs:string"/>
        </xs:sequence>
      </xs:complexType>
    </xs:schema>
  </wsdl:types>
</wsdl:definitions>"#;

fn fixture() -> (TypeTable, TypedValue) {
    let service = wsdl::parse(ORDERS_WSDL).unwrap();
    let table = TypeTable::build(&service);
    let value = TypedValue::new("PlaceOrder")
        .with_field("Reference", "ord-42")
        .with_field("Quantity", 12i64)
        .with_field(
            "Item",
            Value::Array((0..16).map(|i| Value::from(format!("item-{}", i))).collect::<Vec<_>>()),
        )
        .with_field(
            "Customer",
            TypedValue::new("Customer")
                .with_field("Name", "Ada Lovelace")
                .with_field("City", "Turin"),
        );
    (table, value)
}

fn bench_marshal(c: &mut Criterion) {
    let (table, value) = fixture();
    c.bench_function("marshal", |b| {
        b.iter(|| {
            let doc = soap::marshal(black_box(&value), "PlaceOrder", "urn:orders", &table).unwrap();
            black_box(doc.to_xml_string().unwrap())
        })
    });
}

fn bench_unmarshal(c: &mut Criterion) {
    let (table, value) = fixture();
    let xml = soap::marshal(&value, "PlaceOrder", "urn:orders", &table)
        .unwrap()
        .to_xml_string()
        .unwrap();
    let body = Document::from_string(&xml)
        .unwrap()
        .root()
        .unwrap()
        .find_descendant(soapbind::SOAP_ENVELOPE_NAMESPACE, "Body")
        .unwrap()
        .clone();

    c.bench_function("unmarshal", |b| {
        b.iter(|| {
            soap::unmarshal(black_box(&body), "PlaceOrder", &table, DecodeMode::Strict).unwrap()
        })
    });
}

fn bench_table_build(c: &mut Criterion) {
    let service = wsdl::parse(ORDERS_WSDL).unwrap();
    c.bench_function("type_table_build", |b| {
        b.iter(|| TypeTable::build(black_box(&service)))
    });
}

criterion_group!(benches, bench_marshal, bench_unmarshal, bench_table_build);
criterion_main!(benches);
