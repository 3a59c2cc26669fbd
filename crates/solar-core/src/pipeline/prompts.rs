pub const ROOFTOP_CHECK_PROMPT: &str = "Does this image show a building rooftop that could hold solar panels \
(aerial, drone or street-level view)? Answer with a single word: yes or no.";

pub const PANEL_CHECK_PROMPT: &str = "Does this image show one or more installed solar panels? \
Answer with a single word: yes or no.";

pub const INSTALLATION_PROMPT: &str = r#"You are a solar installation surveyor. Analyze the rooftop in this image and plan a panel layout.

Respond with JSON only, no prose, using this shape:
{
  "roofType": "gable | hip | shed | flat | complex",
  "estimatedRoofAreaSqFt": number,
  "usableRoofAreaSqFt": number,
  "coveragePercent": number (0-100),
  "efficiencyPercent": number (0-100),
  "totalPanels": number,
  "panelRegions": [
    { "x": number, "y": number, "width": number, "height": number, "roofSection": string }
  ],
  "notes": string,
  "orientationAnalysis": string,
  "shadingAnalysis": string
}

Rules for panelRegions:
- Coordinates are fractions of the image width/height with the origin at the top-left corner.
- Place panels only on the roof surface, at least 5% from the left/right image edges and 10% from the top/bottom edges.
- Every panel must be 0.04-0.12 wide and 0.03-0.08 tall, all panels the same size.
- Panels must not overlap; keep a visible gap between neighbours."#;

pub const FAULT_PROMPT: &str = r#"You are a solar panel inspector. Identify visible faults on the panel in this image.

Respond with JSON only, no prose, using this shape:
{
  "faults": [
    { "type": string, "severity": "Critical | High | Medium | Low", "x": number, "y": number, "description": string }
  ]
}

Use only these fault types: Hail Damage, Cell Damage/Cracking, Micro-crack, Dirt/Debris,
Cell Discoloration, Hot Spot, Frame Damage, Shading, Corrosion, Delamination.
x and y are the fault position as fractions of the image width/height (top-left origin).
Return an empty list when the panel looks healthy."#;
